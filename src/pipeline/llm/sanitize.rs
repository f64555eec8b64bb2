//! Post-LLM output cleanup.
//!
//! Strips model artifacts (thinking blocks, stray tokens, Markdown code
//! fences) before the reply is parsed, and the heading the note template
//! forbids once the note text is extracted.

use std::sync::LazyLock;

use regex::Regex;

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n?(.*?)\n?```$").expect("valid regex"));
static NOTE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\**note d['’]évolution\s*:?\**\s*:?\s*").expect("valid regex")
});

/// Strip model-specific artifacts from raw LLM output.
///
/// Handles:
/// 1. `<think>...</think>` reasoning blocks
/// 2. Gemma `<unusedN>thought\n` prefixes and stray `<unusedN>` tokens
/// 3. A Markdown code fence wrapping the whole reply
pub fn sanitize_llm_output(raw: &str) -> String {
    let mut text = THINK_BLOCK_RE.replace_all(raw, "").to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + "thought\n".len()..].to_string();
        }
    }
    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();

    let trimmed = text.trim();
    match CODE_FENCE_RE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Remove a leading "Note d'évolution :" heading from a note.
pub fn strip_note_heading(note: &str) -> String {
    NOTE_HEADING_RE.replace(note.trim(), "").trim().to_string()
}
