//! Note service: the request/response contract with the external
//! text-generation service, on top of any [`LlmClient`].

use std::sync::Arc;

use serde::Deserialize;

use super::prompt::{
    build_clinical_question_prompt, build_note_prompt, build_shift_report_prompt,
    CLINICAL_ASSISTANT_SYSTEM_PROMPT, NOTE_SYSTEM_PROMPT, SHIFT_REPORT_SYSTEM_PROMPT,
};
use super::sanitize::{sanitize_llm_output, strip_note_heading};
use super::{LlmClient, ServiceError};
use crate::models::AnswerComplexity;

/// Text used when the service answers without a usable note.
pub const NOTE_FALLBACK: &str = "La note n'a pas pu être générée.";

/// External text-generation service as seen by the pipeline.
pub trait NoteService: Send + Sync {
    /// Turn a clinical summary into a finished progress note.
    fn generate_note(&self, clinical_summary: &str) -> Result<String, ServiceError>;

    /// Summarise the shift's notes into a Markdown hand-off report.
    fn generate_shift_report(&self, shift_notes: &str) -> Result<String, ServiceError>;

    /// Answer a free-text clinical question at the requested level.
    fn answer_question(
        &self,
        question: &str,
        complexity: AnswerComplexity,
    ) -> Result<String, ServiceError>;
}

/// [`NoteService`] backed by an LLM client and a model name.
pub struct LlmNoteService {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl LlmNoteService {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl NoteService for LlmNoteService {
    fn generate_note(&self, clinical_summary: &str) -> Result<String, ServiceError> {
        let prompt = build_note_prompt(clinical_summary);
        let raw = self
            .client
            .generate_json(&self.model, &prompt, NOTE_SYSTEM_PROMPT)?;
        parse_note_response(&raw)
    }

    fn generate_shift_report(&self, shift_notes: &str) -> Result<String, ServiceError> {
        let prompt = build_shift_report_prompt(shift_notes);
        let raw = self
            .client
            .generate(&self.model, &prompt, SHIFT_REPORT_SYSTEM_PROMPT)?;
        Ok(sanitize_llm_output(&raw))
    }

    fn answer_question(
        &self,
        question: &str,
        complexity: AnswerComplexity,
    ) -> Result<String, ServiceError> {
        let prompt = build_clinical_question_prompt(question, complexity);
        let raw = self
            .client
            .generate(&self.model, &prompt, CLINICAL_ASSISTANT_SYSTEM_PROMPT)?;
        Ok(sanitize_llm_output(&raw))
    }
}

#[derive(Deserialize)]
struct NoteResponse {
    #[serde(default)]
    note: Option<String>,
}

/// Extract the note from a `{"note": "..."}` reply.
///
/// A missing or blank `note` yields [`NOTE_FALLBACK`]; a reply that is not
/// JSON at all is a [`ServiceError::MalformedResponse`].
pub fn parse_note_response(raw: &str) -> Result<String, ServiceError> {
    let cleaned = sanitize_llm_output(raw);
    let parsed: NoteResponse = serde_json::from_str(&cleaned)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

    let note = parsed
        .note
        .map(|n| strip_note_heading(&n))
        .filter(|n| !n.is_empty());

    match note {
        Some(note) => Ok(note),
        None => {
            tracing::warn!("Service reply carried no note, using fallback text");
            Ok(NOTE_FALLBACK.to_string())
        }
    }
}
