//! Pipeline orchestrator: ties fetcher → extraction → stitching together.
//!
//! Strictly sequential over identifiers, with a randomized politeness delay
//! between fetches. One identifier's failure never aborts the batch: it is
//! recorded and the loop moves on. Re-running the whole batch is the recovery
//! path for failed ids and is idempotent modulo upstream document changes.

use crate::config::AppConfig;
use crate::extract::{self, ExtractedFields};
use crate::loader;
use crate::models::{Baseline, CharacterRecord, CharacterRef, Element, WeaponClass};
use crate::scraper::{HoyowikiClient, WikiSource};
use crate::storage::{self, RunReport};
use anyhow::{Context, Result};
use chrono::Utc;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Pipeline {
    config: AppConfig,
}

#[derive(Debug)]
pub struct PipelineStats {
    pub processed: usize,
    pub written: usize,
    pub failed_ids: Vec<String>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<PipelineStats> {
        let started_at = Utc::now().naive_utc();

        let baseline = loader::load_baseline(&self.config.storage.baseline_file);
        let mut refs = loader::load_character_refs(&self.config.storage.characters_file)?;
        if let Some(limit) = self.config.pipeline.limit {
            refs.truncate(limit);
        }

        let source =
            HoyowikiClient::new(&self.config.scraper).context("Failed to build wiki client")?;

        let (records, failed_ids) = self.process_batch(&source, &refs, &baseline).await;

        storage::write_records(&self.config.storage.out_file, &records)?;
        let report = RunReport {
            started_at,
            finished_at: Utc::now().naive_utc(),
            processed: refs.len(),
            written: records.len(),
            failed_ids: failed_ids.clone(),
        };
        storage::write_report(&self.config.storage.report_file, &report)?;

        info!(
            "Wrote {} records to {:?}",
            records.len(),
            self.config.storage.out_file
        );
        if !failed_ids.is_empty() {
            warn!("Failed ids ({}): {:?}", failed_ids.len(), failed_ids);
        }

        Ok(PipelineStats {
            processed: refs.len(),
            written: records.len(),
            failed_ids,
        })
    }

    /// Fetch, extract and stitch every identifier. Failures collect into the
    /// second return value; no partial record is ever emitted for them.
    async fn process_batch<S: WikiSource>(
        &self,
        source: &S,
        refs: &[CharacterRef],
        baseline: &Baseline,
    ) -> (Vec<CharacterRecord>, Vec<String>) {
        let total = refs.len();
        let mut records = Vec::new();
        let mut failed_ids = Vec::new();

        for (idx, character) in refs.iter().enumerate() {
            let Some(id) = character.id() else {
                warn!("[{}/{}] skipping entry without id", idx + 1, total);
                continue;
            };

            match self.process_one(source, &id, character, baseline).await {
                Ok(record) => {
                    info!("[{}/{}] OK {} ({})", idx + 1, total, id, record.name);
                    records.push(record);
                }
                Err(e) => {
                    warn!("[{}/{}] FAIL {}: {:#}", idx + 1, total, id, e);
                    failed_ids.push(id);
                }
            }

            if idx + 1 < total {
                self.polite_delay().await;
            }
        }

        (records, failed_ids)
    }

    async fn process_one<S: WikiSource>(
        &self,
        source: &S,
        id: &str,
        character: &CharacterRef,
        baseline: &Baseline,
    ) -> Result<CharacterRecord> {
        let doc = source.fetch_entry(id).await?;
        let fields = extract::extract_fields(&doc);
        stitch_record(id, character, fields, baseline)
    }

    /// Bound the request rate. Politeness only, not a correctness requirement.
    async fn polite_delay(&self) {
        let base = self.config.scraper.request_delay_ms;
        let jitter = if self.config.scraper.jitter_ms > 0 {
            rand::rng().random_range(0..=self.config.scraper.jitter_ms)
        } else {
            0
        };
        tokio::time::sleep(Duration::from_millis(base + jitter)).await;
    }
}

/// Assemble the canonical record for one identifier.
///
/// The display name is the only required field; it falls back to the
/// enumeration dataset before failing. The stable id and rarity come from the
/// baseline table when the name is known there.
pub fn stitch_record(
    raw_id: &str,
    character: &CharacterRef,
    fields: ExtractedFields,
    baseline: &Baseline,
) -> Result<CharacterRecord> {
    let name = fields
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| character.character_name.clone().filter(|n| !n.is_empty()))
        .with_context(|| format!("No display name resolvable for {}", raw_id))?;

    let element = translate(&fields.element, Element::from_label, "element");
    let weapon_type = translate(&fields.weapon, WeaponClass::from_label, "weapon");

    let rarity = character.rarity.or_else(|| baseline.rarity_for(&name));
    let id = baseline
        .id_for(&name)
        .map(str::to_string)
        .unwrap_or_else(|| raw_id.to_string());

    Ok(CharacterRecord {
        id,
        name,
        element,
        weapon_type,
        rarity,
        region: non_empty(fields.region),
        affiliation: non_empty(fields.affiliation),
        vision_affiliation: non_empty(fields.vision_affiliation),
        role: non_empty(fields.role),
        talents: fields.talents,
        constellations: fields.constellations,
        image_url: character.character_avatar.clone(),
    })
}

/// Category-code translation. Unknown codes map to None and get a diagnostic
/// rather than a guessed default.
fn translate<T>(label: &str, map: impl Fn(&str) -> Option<T>, what: &str) -> Option<T> {
    if label.is_empty() {
        return None;
    }
    let mapped = map(label);
    if mapped.is_none() {
        debug!("Unrecognized {} code {:?}", what, label);
    }
    mapped
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaselineEntry;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    fn character(id: u64, name: &str) -> CharacterRef {
        serde_json::from_value(json!({
            "character_id": id,
            "character_name": name,
            "character_avatar": "https://x/avatar.png"
        }))
        .unwrap()
    }

    fn baseline_with(name: &str, id: &str, rarity: u8) -> Baseline {
        Baseline::from_entries(vec![BaselineEntry {
            id: Some(id.into()),
            name: Some(name.into()),
            rarity: Some(rarity),
        }])
    }

    #[test]
    fn test_stitch_uses_baseline_id_and_rarity() {
        let fields = ExtractedFields {
            name: Some("刻晴".into()),
            element: "雷".into(),
            weapon: "单手剑".into(),
            ..Default::default()
        };
        let record = stitch_record(
            "4001",
            &character(4001, "刻晴"),
            fields,
            &baseline_with("刻晴", "stable-keqing", 5),
        )
        .unwrap();

        assert_eq!(record.id, "stable-keqing");
        assert_eq!(record.rarity, Some(5));
        assert_eq!(record.element, Some(Element::Electro));
        assert_eq!(record.weapon_type, Some(WeaponClass::Sword));
    }

    #[test]
    fn test_stitch_without_baseline_keeps_raw_id_and_no_rarity() {
        let fields = ExtractedFields {
            name: Some("新角色".into()),
            ..Default::default()
        };
        let record =
            stitch_record("9999", &character(9999, "新角色"), fields, &Baseline::default())
                .unwrap();

        assert_eq!(record.id, "9999");
        assert_eq!(record.rarity, None);
        assert_eq!(record.element, None);
        assert_eq!(record.region, None);
    }

    #[test]
    fn test_stitch_name_falls_back_to_enumeration() {
        let fields = ExtractedFields::default();
        let record =
            stitch_record("77", &character(77, "枫原万叶"), fields, &Baseline::default()).unwrap();
        assert_eq!(record.name, "枫原万叶");
    }

    #[test]
    fn test_stitch_fails_without_any_name() {
        let unnamed: CharacterRef =
            serde_json::from_value(json!({ "character_id": 42 })).unwrap();
        let err = stitch_record("42", &unnamed, ExtractedFields::default(), &Baseline::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_unknown_codes_map_to_none() {
        let fields = ExtractedFields {
            name: Some("某人".into()),
            element: "以太".into(),
            weapon: "拳套".into(),
            ..Default::default()
        };
        let record =
            stitch_record("1", &character(1, "某人"), fields, &Baseline::default()).unwrap();
        assert_eq!(record.element, None);
        assert_eq!(record.weapon_type, None);
    }

    // ── Batch behavior ────────────────────────────────────────────────────────

    struct ScriptedSource;

    #[async_trait]
    impl WikiSource for ScriptedSource {
        async fn fetch_entry(&self, entry_page_id: &str) -> Result<Value> {
            match entry_page_id {
                "1" => Ok(json!({ "data": { "page": {
                    "name": "安柏",
                    "list": [{ "name": "地区", "value": "蒙德" }]
                } } })),
                _ => Err(anyhow!("HTTP 500 after all retries")),
            }
        }
    }

    fn quick_pipeline() -> Pipeline {
        let mut config = AppConfig::default();
        config.scraper.request_delay_ms = 0;
        config.scraper.jitter_ms = 0;
        Pipeline::new(config)
    }

    #[tokio::test]
    async fn test_failed_fetch_recorded_batch_continues() {
        let refs = vec![character(1, "安柏"), character(2, "丽莎")];
        let (records, failed) = quick_pipeline()
            .process_batch(&ScriptedSource, &refs, &Baseline::default())
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "安柏");
        assert_eq!(records[0].region.as_deref(), Some("蒙德"));
        assert_eq!(failed, vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let refs = vec![character(1, "安柏")];
        let pipeline = quick_pipeline();
        let (first, _) = pipeline
            .process_batch(&ScriptedSource, &refs, &Baseline::default())
            .await;
        let (second, _) = pipeline
            .process_batch(&ScriptedSource, &refs, &Baseline::default())
            .await;
        assert_eq!(first, second);
    }
}
