//! Free-text cleanup shared by every field.

use scraper::Html;

/// Values sources use to mean "no data".
const PLACEHOLDERS: &[&str] = &[
    "not specified",
    "not provided",
    "n/a",
    "na",
    "none",
    "null",
    "unknown",
    "tbd",
    "-",
    "--",
];

/// Strip markup, decode entities and collapse whitespace.
///
/// Placeholders come back as an empty string.
pub fn clean_text(input: &str) -> String {
    let text = if input.contains('<') || input.contains('&') {
        let fragment = Html::parse_fragment(input);
        fragment.root_element().text().collect::<Vec<_>>().join(" ")
    } else {
        input.to_string()
    };

    let collapsed = collapse_whitespace(&text);
    if is_placeholder(&collapsed) {
        String::new()
    } else {
        collapsed
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_placeholder(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

/// Cut `s` to at most `max_chars` characters at a word boundary, appending `...`.
pub fn truncate_words(s: &str, max_chars: usize) -> String {
    if max_chars == 0 || s.chars().count() <= max_chars {
        return s.to_string();
    }

    let cut: String = s.chars().take(max_chars).collect();
    let head = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", head.trim_end())
}

/// `None` for empty strings.
pub fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
