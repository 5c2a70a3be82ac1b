//! Named content modules.
//!
//! The page body is organized as `modules[] → components[] → data`, where
//! `data` is a serialized payload (§ payload). Base attributes, the talent and
//! constellation tables, and the alternate `role_talent` encoding all live in
//! here.

use serde_json::Value;

use super::payload::decode_value;
use super::text::normalize;
use super::walk::value_to_text;

/// Module carrying talent tables and the `role_talent` component.
pub const TALENT_MODULE: &str = "天赋";
/// Module carrying constellation tables.
pub const CONSTELLATION_MODULE: &str = "命之座";

const ROLE_TALENT_COMPONENT: &str = "role_talent";

// ── Base attributes ───────────────────────────────────────────────────────────

/// Label/value pairs from every component payload: `attr` lists of `key`/`value`
/// items plus plain `name`/`value` mappings.
pub fn collect_attr_pairs(modules: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for data in component_payloads(modules, None) {
        walk_attrs(&data, &mut pairs, 0);
    }
    pairs
}

fn walk_attrs(value: &Value, out: &mut Vec<(String, String)>, depth: usize) {
    if depth > 64 {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("attr") {
                for item in items {
                    let Some(item) = item.as_object() else { continue };
                    if let (Some(Value::String(key)), Some(v)) = (item.get("key"), item.get("value"))
                    {
                        if !v.is_null() {
                            out.push((key.clone(), value_to_text(v)));
                        }
                    }
                }
            }
            if let (Some(Value::String(name)), Some(v)) = (map.get("name"), map.get("value")) {
                if !v.is_null() {
                    out.push((name.clone(), value_to_text(v)));
                }
            }
            for v in map.values() {
                walk_attrs(v, out, depth + 1);
            }
        }
        Value::Array(items) => {
            for v in items {
                walk_attrs(v, out, depth + 1);
            }
        }
        _ => {}
    }
}

// ── HTML tables ───────────────────────────────────────────────────────────────

/// Rows of every `tables` payload under the named module: (normalized first
/// cell, normalized second cell). Rows with an empty first cell are dropped.
pub fn collect_table_rows(modules: &Value, module_name: &str) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for data in component_payloads(modules, Some(module_name)) {
        let Some(tables) = data.get("tables").and_then(Value::as_array) else {
            continue;
        };
        for table in tables {
            let Some(table_rows) = table.get("row").and_then(Value::as_array) else {
                continue;
            };
            for row in table_rows {
                let Some(cells) = row.as_array() else { continue };
                let title = cells
                    .first()
                    .and_then(Value::as_str)
                    .map(normalize)
                    .unwrap_or_default();
                if title.is_empty() {
                    continue;
                }
                let body = cells
                    .get(1)
                    .and_then(Value::as_str)
                    .map(normalize)
                    .unwrap_or_default();
                rows.push((title, body));
            }
        }
    }
    rows
}

// ── role_talent alternate encoding ────────────────────────────────────────────

/// Secondary talent path: a `list` of items each carrying a tab name, a
/// description, and a one-column attribute table. The detail is the
/// description plus all row texts, newline-joined.
pub fn collect_role_talent(modules: &Value) -> Vec<(String, String)> {
    let mut items = Vec::new();
    let Some(modules) = modules.as_array() else {
        return items;
    };

    for module in modules {
        if module.get("name").and_then(Value::as_str) != Some(TALENT_MODULE) {
            continue;
        }
        let Some(components) = module.get("components").and_then(Value::as_array) else {
            continue;
        };
        for component in components {
            if component.get("component_id").and_then(Value::as_str) != Some(ROLE_TALENT_COMPONENT)
            {
                continue;
            }
            let Some(data) = component.get("data").and_then(decode_value) else {
                continue;
            };
            let Some(list) = data.get("list").and_then(Value::as_array) else {
                continue;
            };
            for item in list {
                let tab_name = item
                    .get("tab_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if tab_name.is_empty() {
                    continue;
                }
                let desc = item
                    .get("desc")
                    .and_then(Value::as_str)
                    .map(normalize)
                    .unwrap_or_default();

                let mut parts = vec![desc];
                if let Some(rows) = item.pointer("/attr/row").and_then(Value::as_array) {
                    for row in rows {
                        if let Some(first) = row.as_array().and_then(|r| r.first()) {
                            if let Some(text) = first.as_str() {
                                parts.push(normalize(text));
                            }
                        }
                    }
                }
                let detail = parts.join("\n").trim().to_string();
                items.push((tab_name.to_string(), detail));
            }
        }
    }
    items
}

// ── Shared plumbing ───────────────────────────────────────────────────────────

/// Decoded `data` payloads of all components, optionally restricted to one
/// module name.
fn component_payloads(modules: &Value, module_name: Option<&str>) -> Vec<Value> {
    let mut payloads = Vec::new();
    let Some(modules) = modules.as_array() else {
        return payloads;
    };

    for module in modules {
        if let Some(wanted) = module_name {
            if module.get("name").and_then(Value::as_str) != Some(wanted) {
                continue;
            }
        }
        let Some(components) = module.get("components").and_then(Value::as_array) else {
            continue;
        };
        for component in components {
            if let Some(data) = component.get("data").and_then(decode_value) {
                if data.is_object() || data.is_array() {
                    payloads.push(data);
                }
            }
        }
    }
    payloads
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn modules_fixture() -> Value {
        json!([
            {
                "name": "基础信息",
                "components": [{
                    "component_id": "baseInfo",
                    "data": r#"{"attr":[{"key":"地区","value":"稻妻"},{"key":"武器","value":"单手剑"}]}"#
                }]
            },
            {
                "name": "天赋",
                "components": [
                    {
                        "component_id": "talent",
                        "data": r#"{"tables":[{"row":[["<b>普通攻击</b>","进行至多五段连续剑击。"],["","无标题行"],["元素战技","造成雷元素伤害。"]]}]}"#
                    },
                    {
                        "component_id": "role_talent",
                        "data": r#"{"list":[{"tab_name":"梦想一刀","desc":"<p>召唤梦想一心。</p>","attr":{"row":[["伤害提升 20%"],["持续 7 秒"]]}}]}"#
                    }
                ]
            }
        ])
    }

    #[test]
    fn test_attr_pairs_from_serialized_components() {
        let pairs = collect_attr_pairs(&modules_fixture());
        assert!(pairs.contains(&("地区".to_string(), "稻妻".to_string())));
        assert!(pairs.contains(&("武器".to_string(), "单手剑".to_string())));
    }

    #[test]
    fn test_table_rows_only_from_named_module() {
        let rows = collect_table_rows(&modules_fixture(), TALENT_MODULE);
        assert_eq!(
            rows,
            vec![
                ("普通攻击".to_string(), "进行至多五段连续剑击。".to_string()),
                ("元素战技".to_string(), "造成雷元素伤害。".to_string()),
            ]
        );
        assert!(collect_table_rows(&modules_fixture(), CONSTELLATION_MODULE).is_empty());
    }

    #[test]
    fn test_role_talent_detail_joined() {
        let items = collect_role_talent(&modules_fixture());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, "梦想一刀");
        assert_eq!(items[0].1, "召唤梦想一心。\n伤害提升 20%\n持续 7 秒");
    }

    #[test]
    fn test_structured_component_data_passes_through() {
        // Some components arrive pre-parsed rather than serialized.
        let modules = json!([{
            "name": "基础信息",
            "components": [{ "data": { "name": "所属", "value": "社奉行" } }]
        }]);
        let pairs = collect_attr_pairs(&modules);
        assert_eq!(pairs, vec![("所属".to_string(), "社奉行".to_string())]);
    }
}
