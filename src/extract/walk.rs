//! Generic traversal over the untyped document tree.
//!
//! The wiki API has no stable schema: the same datum may sit in a flat
//! `name`/`value` pair, a titled section, or several levels down inside a
//! serialized component. These walkers collect every recognizable shape and
//! leave choosing to the field resolver.

use serde_json::Value;

use super::text::normalize;

/// Recursion guard. Real documents are < 20 levels deep; anything past this
/// is a pathological or self-referential payload.
const MAX_DEPTH: usize = 64;

/// An extracted label/value with positional provenance. The path records where
/// the pair was found; it never participates in equality.
#[derive(Debug, Clone, PartialEq)]
pub struct KvPair {
    pub path: Vec<String>,
    pub label: String,
    pub value: String,
}

// ── name/value pairs ──────────────────────────────────────────────────────────

/// Collect every `{"name": …, "value": …}` mapping in the tree, depth-first.
/// Recursion does not stop at a match: nested pairs below a match are still
/// collected.
pub fn collect_kv_pairs(tree: &Value) -> Vec<KvPair> {
    let mut out = Vec::new();
    walk_kv(tree, &mut Vec::new(), &mut out, 0);
    out
}

fn walk_kv(value: &Value, path: &mut Vec<String>, out: &mut Vec<KvPair>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                walk_kv(item, path, out, depth + 1);
            }
        }
        Value::Object(map) => {
            if let (Some(Value::String(name)), Some(v)) = (map.get("name"), map.get("value")) {
                if !v.is_null() {
                    out.push(KvPair {
                        path: path.clone(),
                        label: name.clone(),
                        value: value_to_text(v),
                    });
                }
            }
            for (k, v) in map {
                path.push(k.clone());
                walk_kv(v, path, out, depth + 1);
                path.pop();
            }
        }
        _ => {}
    }
}

// ── Titled sections ───────────────────────────────────────────────────────────

const DESC_KEYS: [&str; 4] = ["desc", "description", "text", "content"];

/// Collect `name`/`title` + description-style pairs. Only arrays made entirely
/// of mappings are scanned element-wise, matching the shape the wiki uses for
/// section lists.
pub fn collect_named_sections(tree: &Value) -> Vec<KvPair> {
    let mut out = Vec::new();
    walk_sections(tree, &mut Vec::new(), &mut out, 0);
    out
}

fn walk_sections(value: &Value, path: &mut Vec<String>, out: &mut Vec<KvPair>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(Value::is_object) {
                for item in items {
                    let Some(map) = item.as_object() else { continue };
                    let name = map
                        .get("name")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .or_else(|| map.get("title").and_then(Value::as_str));
                    let desc = DESC_KEYS.iter().find_map(|k| map.get(*k)).filter(|v| !v.is_null());
                    if let (Some(name), Some(desc)) = (name, desc) {
                        out.push(KvPair {
                            path: path.clone(),
                            label: name.to_string(),
                            value: value_to_text(desc),
                        });
                    }
                }
            }
            for item in items {
                walk_sections(item, path, out, depth + 1);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                path.push(k.clone());
                walk_sections(v, path, out, depth + 1);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Title/content pairs where the mapping itself (not a list element) carries
/// both keys. Used for the `nodules` page area.
pub fn collect_titled_objects(tree: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    walk_titled(tree, &mut out, 0);
    out
}

fn walk_titled(value: &Value, out: &mut Vec<(String, String)>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                walk_titled(item, out, depth + 1);
            }
        }
        Value::Object(map) => {
            let name = map
                .get("title")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| map.get("name").and_then(Value::as_str));
            let desc = ["content", "text", "desc", "description"]
                .iter()
                .find_map(|k| map.get(*k))
                .filter(|v| !v.is_null());
            if let (Some(name), Some(desc)) = (name, desc) {
                out.push((name.to_string(), value_to_text(desc)));
            }
            for v in map.values() {
                walk_titled(v, out, depth + 1);
            }
        }
        _ => {}
    }
}

// ── Value coercion ────────────────────────────────────────────────────────────

/// Reduce an arbitrary value to normalized text. Arrays join their non-empty
/// parts with newlines; objects fall back to the first text-bearing key, then
/// to verbatim JSON as a last resort.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => normalize(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(value_to_text)
                .filter(|p| !p.is_empty())
                .collect();
            parts.join("\n")
        }
        Value::Object(map) => {
            for key in ["text", "content", "desc", "description", "value"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return normalize(s);
                }
            }
            value.to_string()
        }
    }
}

/// First string found under any of `keys`, document order, depth-first.
pub fn find_first_string(tree: &Value, keys: &[&str]) -> Option<String> {
    find_first(tree, keys, 0)
}

fn find_first(value: &Value, keys: &[&str], depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            for k in keys {
                if let Some(Value::String(s)) = map.get(*k) {
                    if !s.is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            map.values().find_map(|v| find_first(v, keys, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|v| find_first(v, keys, depth + 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kv_pairs_found_at_any_depth() {
        let doc = json!({
            "data": {
                "page": {
                    "blocks": [
                        { "name": "地区", "value": "蒙德" },
                        { "deep": { "name": "所属", "value": "西风骑士团" } }
                    ]
                }
            }
        });
        let pairs = collect_kv_pairs(&doc);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].label, "地区");
        assert_eq!(pairs[0].value, "蒙德");
        assert_eq!(pairs[1].path, vec!["data", "page", "blocks", "deep"]);
    }

    #[test]
    fn test_kv_recursion_continues_past_match() {
        let doc = json!({
            "name": "外层",
            "value": { "name": "内层", "value": "嵌套值" }
        });
        let pairs = collect_kv_pairs(&doc);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].label, "内层");
    }

    #[test]
    fn test_kv_value_html_is_normalized() {
        let doc = json!({ "name": "描述", "value": "<p>第一段</p><p>第二段</p>" });
        let pairs = collect_kv_pairs(&doc);
        assert_eq!(pairs[0].value, "第一段\n第二段");
    }

    #[test]
    fn test_named_sections_from_object_lists() {
        let doc = json!({
            "list": [
                { "title": "神里流·霰步", "desc": "向前方快速移动。" },
                { "name": "神里流·冰华", "text": "造成冰元素伤害。" },
                { "other": true }
            ]
        });
        let sections = collect_named_sections(&doc);
        // Shapeless elements are skipped individually.
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "神里流·霰步");
        assert_eq!(sections[1].value, "造成冰元素伤害。");
    }

    #[test]
    fn test_value_to_text_array_joins_and_skips_empties() {
        let v = json!(["第一", "", "第二"]);
        assert_eq!(value_to_text(&v), "第一\n第二");
    }

    #[test]
    fn test_value_to_text_object_prefers_text_keys() {
        let v = json!({ "text": "内容", "id": 7 });
        assert_eq!(value_to_text(&v), "内容");

        // No text-bearing key: serialized verbatim as a last resort.
        let opaque = json!({ "id": 7 });
        assert_eq!(value_to_text(&opaque), "{\"id\":7}");
    }

    #[test]
    fn test_find_first_string_document_order() {
        let doc = json!({
            "a": [{ "title": "第二候选" }],
            "b": { "name": "第一候选" }
        });
        // "a" comes first in document order; "title" matches there.
        assert_eq!(
            find_first_string(&doc, &["name", "title"]).as_deref(),
            Some("第二候选")
        );
    }

    #[test]
    fn test_depth_guard_terminates() {
        let mut doc = json!("leaf");
        for _ in 0..200 {
            doc = json!({ "next": doc });
        }
        assert!(collect_kv_pairs(&doc).is_empty());
        assert_eq!(find_first_string(&doc, &["missing"]), None);
    }
}
