//! Heterogeneous attribute extraction.
//!
//! One wiki document may expose the same attribute as a flat `name`/`value`
//! pair, a titled section, a serialized component payload, or a filter tag.
//! Every collector runs over the whole tree; the resolver then tries an
//! ordered chain of candidate labels per canonical field and takes the first
//! non-empty hit. Unresolved fields stay empty — never an error.

pub mod modules;
pub mod payload;
pub mod text;
pub mod walk;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use self::modules::{CONSTELLATION_MODULE, TALENT_MODULE};
use self::walk::KvPair;

// ── Candidate label chains ────────────────────────────────────────────────────
//
// Order is the resolution policy: earlier labels win. These mirror the label
// variants observed across wiki revisions.

const REGION_LABELS: &[&str] = &["地区", "所属地区", "国籍"];
const AFFILIATION_LABELS: &[&str] = &["所属", "所属势力", "所属机构", "所属城邦", "所属国家"];
const VISION_LABELS: &[&str] = &["神之眼所属", "神之眼", "元素之眼", "神之眼类型"];
const ELEMENT_LABELS: &[&str] = &["元素", "元素属性"];
const ROLE_LABELS: &[&str] = &["定位", "定位/称号", "称号"];
const WEAPON_LABELS: &[&str] = &["武器", "武器类型", "武器类别"];

/// Everything the engine could pull out of one document. Category codes are
/// still raw source labels here; enum translation happens at stitch time.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub region: String,
    pub affiliation: String,
    pub vision_affiliation: String,
    pub element: String,
    pub role: String,
    pub weapon: String,
    pub talents: IndexMap<String, String>,
    pub constellations: IndexMap<String, String>,
}

/// Run all collectors over a fetched document and resolve every canonical
/// field.
pub fn extract_fields(doc: &Value) -> ExtractedFields {
    let page = doc.pointer("/data/page").unwrap_or(&Value::Null);
    let modules = page.get("modules").unwrap_or(&Value::Null);

    // Label map: generic pairs first, then module attr pairs. First seen wins.
    let kv_pairs = walk::collect_kv_pairs(doc);
    let mut label_map: IndexMap<String, String> = IndexMap::new();
    for pair in &kv_pairs {
        insert_first_wins(&mut label_map, &pair.label, &pair.value);
    }
    for (label, value) in modules::collect_attr_pairs(modules) {
        insert_first_wins(&mut label_map, &label, &value);
    }

    // Titled sections, including the nodules page area.
    let mut sections = walk::collect_named_sections(doc);
    if let Some(nodules) = page.get("nodules") {
        for (label, value) in walk::collect_titled_objects(nodules) {
            sections.push(KvPair {
                path: vec!["nodules".to_string()],
                label,
                value,
            });
        }
    }

    let filters = payload::page_filters(doc);

    let resolve = |candidates: &[&str]| -> String {
        resolve_field(&label_map, &sections, &filters, candidates)
    };

    let name = page
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| walk::find_first_string(doc, &["name", "title"]));

    let mut fields = ExtractedFields {
        name,
        region: resolve(REGION_LABELS),
        affiliation: resolve(AFFILIATION_LABELS),
        vision_affiliation: resolve(VISION_LABELS),
        element: resolve(ELEMENT_LABELS),
        role: resolve(ROLE_LABELS),
        weapon: resolve(WEAPON_LABELS),
        ..Default::default()
    };

    collect_abilities(&mut fields, &sections, modules);
    fields
}

/// Ordered fallback: label map → titled sections → filter tags. First
/// non-empty match; empty when nothing matches.
fn resolve_field(
    label_map: &IndexMap<String, String>,
    sections: &[KvPair],
    filters: &IndexMap<String, String>,
    candidates: &[&str],
) -> String {
    for candidate in candidates {
        if let Some(value) = label_map.get(*candidate) {
            return value.clone();
        }
    }
    for section in sections {
        if candidates.contains(&section.label.as_str()) && !section.value.is_empty() {
            return section.value.clone();
        }
    }
    for candidate in candidates {
        if let Some(value) = filters.get(*candidate) {
            return value.clone();
        }
    }
    String::new()
}

/// Talent and constellation maps, in document order.
///
/// Path-matched sections land first (a later section with the same title
/// supersedes it, as in the live page body). The role-talent encoding and the
/// module tables then fill in first-wins: a table row never clobbers an entry
/// an earlier source already produced.
fn collect_abilities(fields: &mut ExtractedFields, sections: &[KvPair], modules: &Value) {
    for section in sections {
        let path = section.path.join("/").to_lowercase();
        if path.contains("talent") || path.contains("天赋") || path.contains("skill") {
            fields
                .talents
                .insert(section.label.clone(), section.value.clone());
        } else if path.contains("constellation") || path.contains("命之座") {
            fields
                .constellations
                .insert(section.label.clone(), section.value.clone());
        }
    }

    for (title, detail) in modules::collect_role_talent(modules) {
        if !detail.is_empty() {
            debug!("role_talent {}: {}", title, crate::utils::ellipsize(&detail, 60));
            fields.talents.entry(title).or_insert(detail);
        }
    }
    for (title, body) in modules::collect_table_rows(modules, TALENT_MODULE) {
        fields.talents.entry(title).or_insert(body);
    }

    for (title, body) in modules::collect_table_rows(modules, CONSTELLATION_MODULE) {
        fields.constellations.insert(title, body);
    }
}

fn insert_first_wins(map: &mut IndexMap<String, String>, label: &str, value: &str) {
    if label.is_empty() || value.is_empty() {
        return;
    }
    if !map.contains_key(label) {
        map.insert(label.to_string(), value.to_string());
    }
}
