//! Markup helpers shared by the widgets.
//!
//! Widgets produce HTML fragments as plain strings; the host decides how to
//! put them on screen.

use std::ops::Range;

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Markup shown in place of the selected entry when nothing renders.
pub fn placeholder_markup(placeholder_text: &str) -> String {
    format!(
        r#"<div class="placeholder-text">{}</div>"#,
        escape_html(placeholder_text)
    )
}

/// Char ranges of every case-insensitive, non-overlapping occurrence of
/// `needle` in `haystack`.
pub fn match_ranges(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let hay: Vec<char> = haystack.chars().collect();
    let folded: Vec<Vec<char>> = hay.iter().map(|c| c.to_lowercase().collect()).collect();

    let mut ranges = Vec::new();
    let mut start = 0;
    while start < hay.len() {
        if let Some(end) = match_at(&folded, start, &needle) {
            ranges.push(start..end);
            start = end;
        } else {
            start += 1;
        }
    }
    ranges
}

/// Match `needle` against the case-folded chars starting at `start`,
/// returning the end offset on success.
fn match_at(folded: &[Vec<char>], start: usize, needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    let mut index = start;
    while matched < needle.len() {
        let chars = folded.get(index)?;
        if needle.len() - matched < chars.len() || needle[matched..matched + chars.len()] != chars[..] {
            return None;
        }
        matched += chars.len();
        index += 1;
    }
    Some(index)
}

/// Escape `text` and wrap each range in `<span class="tr-highlighted-text">`.
pub fn highlight(text: &str, ranges: &[Range<usize>]) -> String {
    if ranges.is_empty() {
        return escape_html(text);
    }
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + ranges.len() * 40);
    let mut position = 0;
    for range in ranges {
        let start = range.start.min(chars.len());
        let end = range.end.min(chars.len());
        if start < position || start >= end {
            continue;
        }
        out.push_str(&escape_html(&chars[position..start].iter().collect::<String>()));
        out.push_str(r#"<span class="tr-highlighted-text">"#);
        out.push_str(&escape_html(&chars[start..end].iter().collect::<String>()));
        out.push_str("</span>");
        position = end;
    }
    out.push_str(&escape_html(&chars[position..].iter().collect::<String>()));
    out
}
