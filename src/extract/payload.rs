//! Embedded serialized payloads.
//!
//! Component data and the page's `fe_ext` field arrive as JSON serialized
//! inside JSON, sometimes escaped twice over and sometimes entity-encoded on
//! top. Decoding is best-effort with a bounded repair budget; a value that
//! never parses is handed back unchanged rather than dropped.

use indexmap::IndexMap;
use serde_json::Value;

/// Result of trying to decode a suspected serialized structure.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Decoded(Value),
    Unchanged(String),
}

impl DecodeOutcome {
    pub fn decoded(self) -> Option<Value> {
        match self {
            Self::Decoded(v) => Some(v),
            Self::Unchanged(_) => None,
        }
    }
}

/// Decode a string that may hold serialized JSON.
///
/// Two parse attempts, with one escape-repair pass (`\"` → `"`, `\\` → `\`)
/// between them, then a final attempt after entity unescaping. Anything still
/// unparseable comes back as `Unchanged`.
pub fn decode_embedded(raw: &str) -> DecodeOutcome {
    let mut s = raw.to_string();
    for _ in 0..2 {
        if let Ok(v) = serde_json::from_str(&s) {
            return DecodeOutcome::Decoded(v);
        }
        s = s.replace("\\\"", "\"").replace("\\\\", "\\");
    }
    if let Ok(v) = serde_json::from_str(&unescape_entities(&s)) {
        return DecodeOutcome::Decoded(v);
    }
    DecodeOutcome::Unchanged(raw.to_string())
}

/// Decode a component `data` value: strings go through `decode_embedded`,
/// already-structured values pass through.
pub fn decode_value(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => decode_embedded(s).decoded(),
        Value::Object(_) | Value::Array(_) => Some(value.clone()),
        _ => None,
    }
}

/// Minimal HTML entity unescape for serialized payloads. Covers the entities
/// the wiki actually emits inside escaped JSON.
pub fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        // Entities are short; anything further out is a bare ampersand.
        let Some(end) = rest.find(';').filter(|&e| e > 1 && e <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..end];
        let replacement = match entity {
            "quot" => Some('"'),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix('#')
                .and_then(|num| {
                    if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        num.parse().ok()
                    }
                })
                .and_then(char::from_u32),
        };

        match replacement {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ── Filter tags ───────────────────────────────────────────────────────────────

/// Collect `"category/value"` tags from every `filter.text` payload in the
/// tree. The payload is either a list already or a serialized list decoded via
/// `decode_embedded`. The first occurrence of a category wins; later
/// duplicates are discarded.
pub fn parse_filter_tags(tree: &Value) -> IndexMap<String, String> {
    let mut texts = Vec::new();
    collect_filter_texts(tree, &mut texts, 0);

    let mut filters = IndexMap::new();
    for text in texts {
        let items = match text {
            Value::Array(items) => items,
            Value::String(s) => match decode_embedded(&s).decoded() {
                Some(Value::Array(items)) => items,
                _ => continue,
            },
            _ => continue,
        };
        for item in items {
            let Value::String(tag) = item else { continue };
            let Some((category, value)) = tag.split_once('/') else {
                continue;
            };
            if !category.is_empty() && !value.is_empty() {
                filters
                    .entry(category.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }
    filters
}

fn collect_filter_texts(value: &Value, out: &mut Vec<Value>, depth: usize) {
    if depth > 64 {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(filter)) = map.get("filter") {
                if let Some(text) = filter.get("text") {
                    out.push(text.clone());
                }
            }
            for v in map.values() {
                collect_filter_texts(v, out, depth + 1);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_filter_texts(v, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// Filter tags for one document: decode `data.page.ext.fe_ext` (serialized,
/// possibly doubly so) and walk the result.
pub fn page_filters(doc: &Value) -> IndexMap<String, String> {
    let Some(fe_ext) = doc.pointer("/data/page/ext/fe_ext") else {
        return IndexMap::new();
    };
    let decoded = match fe_ext {
        Value::String(s) => match decode_embedded(s) {
            DecodeOutcome::Decoded(v) => v,
            DecodeOutcome::Unchanged(_) => return IndexMap::new(),
        },
        other => other.clone(),
    };
    if decoded.is_object() || decoded.is_array() {
        parse_filter_tags(&decoded)
    } else {
        IndexMap::new()
    }
}
