//! External text-generation service: LLM client abstraction, the Ollama
//! backend, prompt templates and the note service built on top of them.

pub mod note_service;
pub mod ollama;
pub mod prompt;
pub mod sanitize;

pub use note_service::*;
pub use ollama::*;
pub use prompt::*;
pub use sanitize::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed note response: {0}")]
    MalformedResponse(String),
}

/// LLM client abstraction (allows mocking).
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, ServiceError>;

    /// Same as [`LlmClient::generate`] but asks the backend to constrain the
    /// reply to a JSON document.
    fn generate_json(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, ServiceError> {
        self.generate(model, prompt, system)
    }

    fn is_model_available(&self, model: &str) -> Result<bool, ServiceError>;

    fn list_models(&self) -> Result<Vec<String>, ServiceError>;
}
