//! HTML fragment → normalized plain text.
//!
//! Wiki payloads embed HTML everywhere: attribute values, table cells,
//! serialized component data. Some of it is double-encoded (`&lt;p&gt;…`),
//! so the DOM pass runs a second time when the first one re-exposed markup.

use ::scraper::Html;

/// Normalize an HTML fragment to plain text.
///
/// Line-break markup becomes `\n`, tags are stripped, entities decoded,
/// `[详情]`-style boilerplate removed, whitespace collapsed. Idempotent on
/// already-normalized input.
pub fn normalize(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut s = dom_text(&replace_breaks(html));

    // First entity decode may have re-exposed markup (double-encoded input).
    if looks_like_markup(&s) {
        s = dom_text(&replace_breaks(&s));
    }

    s = s.replace("\\u00a0", " ").replace('\u{a0}', " ");
    s = strip_detail_markers(&s);
    s = collapse_whitespace(&s);
    s.trim().to_string()
}

/// Replace `<br…>` and `</p>` with newlines, case-insensitively, before the
/// DOM pass eats them.
fn replace_breaks(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let bytes = html.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            let rest = &html[i..];
            let tail = &bytes[i..];
            let lower_is = |prefix: &[u8]| {
                tail.len() > prefix.len()
                    && tail[..prefix.len()].eq_ignore_ascii_case(prefix)
                    && matches!(tail[prefix.len()], b'>' | b'/' | b' ' | b'\t')
            };
            if lower_is(b"<br") || lower_is(b"</p") {
                // Skip to the closing '>' of this tag.
                match rest.find('>') {
                    Some(end) => {
                        out.push('\n');
                        i += end + 1;
                        continue;
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
            }
        }
        let ch = html[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Parse as a fragment and collect text nodes. html5ever strips tags and
/// decodes entities in one go.
fn dom_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

fn looks_like_markup(s: &str) -> bool {
    match s.find('<') {
        // '<' immediately followed by a letter or '/' reads as a tag.
        Some(pos) => s[pos + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/'),
        None => false,
    }
}

/// Drop `[详情]` / `详情` "see more" markers, including stray brackets and
/// surrounding spaces.
fn strip_detail_markers(s: &str) -> String {
    const MARKER: &str = "详情";
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find(MARKER) {
        let mut head = &rest[..pos];
        // Trim trailing spaces and one '[' before the marker.
        head = head.trim_end_matches([' ', '\t']);
        head = head.strip_suffix('[').unwrap_or(head);
        out.push_str(head);

        let mut tail = &rest[pos + MARKER.len()..];
        tail = tail.trim_start_matches([' ', '\t']);
        tail = tail.strip_prefix(']').unwrap_or(tail);
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Collapse horizontal whitespace runs to one space and blank-line runs to a
/// single newline.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                // Swallow any following spaces/newlines; keep one newline.
                let mut saw_more_newlines = false;
                let mut pending_spaces = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        saw_more_newlines = true;
                        pending_spaces.clear();
                        chars.next();
                    } else if next == ' ' || next == '\t' || next == '\r' {
                        pending_spaces.push(' ');
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push('\n');
                if !saw_more_newlines && !pending_spaces.is_empty() {
                    out.push(' ');
                }
            }
            ' ' | '\t' | '\r' | '\u{b}' | '\u{c}' => {
                if !out.ends_with(' ') && !out.ends_with('\n') && !out.is_empty() {
                    out.push(' ');
                }
                while let Some(&next) = chars.peek() {
                    if matches!(next, ' ' | '\t' | '\r' | '\u{b}' | '\u{c}') {
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_breaks() {
        let html = "<p>冰元素的<strong>神之眼</strong>持有者。<br/>骑士团成员。</p>";
        assert_eq!(normalize(html), "冰元素的神之眼持有者。\n骑士团成员。");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(normalize("A &amp; B&nbsp;&nbsp;C"), "A & B C");
    }

    #[test]
    fn test_double_encoded_markup() {
        // Entity-encoded tags only become visible after the first decode.
        let html = "&lt;p&gt;雷电将军&lt;br&gt;稻妻&lt;/p&gt;";
        assert_eq!(normalize(html), "雷电将军\n稻妻");
    }

    #[test]
    fn test_detail_marker_removed() {
        assert_eq!(normalize("元素爆发 [详情] 说明"), "元素爆发 说明");
        assert_eq!(normalize("元素爆发[ 详情 ]"), "元素爆发");
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(normalize("第一行\n\n\n第二行   第三段"), "第一行\n第二行 第三段");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "<p>A<br>B</p> &amp; <b>C</b>",
            "&lt;div&gt;嵌套&lt;/div&gt;",
            "纯文本，无标记。",
            "多行\n\n内容  与空格",
        ];
        for html in samples {
            let once = normalize(html);
            assert_eq!(normalize(&once), once, "not idempotent for {html:?}");
        }
    }

    #[test]
    fn test_plain_less_than_survives() {
        assert_eq!(normalize("生命值 < 50% 时"), "生命值 < 50% 时");
    }
}
