//! List formatting and the final whitespace normalization pass.

use std::sync::LazyLock;

use regex::Regex;

/// Join items as French prose: "a", "a et b", "a, b et c".
///
/// Blank entries are dropped before counting.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    format_list_with(items, "et")
}

/// Same as [`format_list`] with a custom last conjunction ("ou", "et").
pub fn format_list_with<S: AsRef<str>>(items: &[S], conjunction: &str) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();

    match items.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} {conjunction} {second}"),
        [head @ .., last] => format!("{} {conjunction} {last}", head.join(", ")),
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase every item of a selection for use inside a sentence.
pub fn lowercased<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    items.into_iter().map(str::to_lowercase).collect()
}

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\s+").expect("valid regex"));
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,])").expect("valid regex"));

/// Collapse whitespace runs and strip whitespace before '.' and ','.
pub fn normalize_paragraph(text: &str) -> String {
    let collapsed = MULTI_SPACE_RE.replace_all(text.trim(), " ");
    SPACE_BEFORE_PUNCT_RE
        .replace_all(&collapsed, "$1")
        .trim()
        .to_string()
}

/// Normalize each paragraph, drop the empty ones, join with blank lines.
pub fn join_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| normalize_paragraph(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_list_cases() {
        let empty: [&str; 0] = [];
        assert_eq!(format_list(&empty), "");
        assert_eq!(format_list(&["a"]), "a");
        assert_eq!(format_list(&["a", "b"]), "a et b");
        assert_eq!(format_list(&["a", "b", "c"]), "a, b et c");
    }

    #[test]
    fn format_list_filters_blank_before_counting() {
        assert_eq!(format_list(&["", "a", "  "]), "a");
        assert_eq!(format_list(&["a", "", "b"]), "a et b");
    }

    #[test]
    fn custom_conjunction() {
        assert_eq!(format_list_with(&["temps", "lieu", "personne"], "ou"), "temps, lieu ou personne");
    }

    #[test]
    fn capitalize_handles_accents_and_empty() {
        assert_eq!(capitalize_first("état stable"), "État stable");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn normalize_collapses_and_strips_before_punctuation() {
        assert_eq!(normalize_paragraph("  Il  est   calme .  Stable , oui "), "Il est calme. Stable, oui");
    }

    #[test]
    fn join_drops_empty_paragraphs() {
        let paras = vec!["Un.".to_string(), "   ".to_string(), "Deux.".to_string()];
        assert_eq!(join_paragraphs(&paras), "Un.\n\nDeux.");
    }
}
