//! Persistence of the batch output: the record collection itself plus a small
//! run report. Both are JSON seed files consumed by the downstream importer.

use crate::models::CharacterRecord;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of one batch run, written alongside the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub processed: usize,
    pub written: usize,
    pub failed_ids: Vec<String>,
}

pub fn write_records(path: &Path, records: &[CharacterRecord]) -> Result<()> {
    write_json(path, records)
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    write_json(path, report)
}

/// Read back a previously written record collection (used by `stats`).
pub fn read_records(path: &Path) -> Result<Vec<CharacterRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("No output file at {:?} — run `wiki-etl update` first", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("Could not write {:?}", path))
}
