use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{LlmClient, ServiceError};

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client pointing at an Ollama instance. Every request is
    /// bounded by `timeout_secs`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434 with a 2-minute timeout.
    pub fn default_local() -> Result<Self, ServiceError> {
        Self::new(DEFAULT_OLLAMA_URL, 120)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True when the server answers `/api/tags`.
    pub fn is_reachable(&self) -> bool {
        match self.list_models() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.base_url, error = %e, "Ollama not reachable");
                false
            }
        }
    }

    fn post_generate(&self, body: &OllamaGenerateRequest<'_>) -> Result<String, ServiceError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_connect() {
            ServiceError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            ServiceError::Timeout(self.timeout_secs)
        } else {
            ServiceError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, ServiceError> {
        self.post_generate(&OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format: None,
        })
    }

    fn generate_json(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, ServiceError> {
        self.post_generate(&OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format: Some("json"),
        })
    }

    fn is_model_available(&self, model: &str) -> Result<bool, ServiceError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Mock LLM client for testing: returns a configurable response, records the
/// prompts it receives and can be switched into failure mode.
pub struct MockLlmClient {
    response: Mutex<String>,
    available_models: Vec<String>,
    failing: AtomicBool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(response.to_string()),
            available_models: vec!["llama3.1:8b".to_string()],
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }

    /// Every subsequent call fails with a connection error while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_response(&self, response: &str) {
        if let Ok(mut current) = self.response.lock() {
            *current = response.to_string();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, prompt: &str, _system: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::OllamaConnection("mock".into()));
        }
        Ok(self
            .response
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    fn is_model_available(&self, model: &str) -> Result<bool, ServiceError> {
        Ok(self.available_models.iter().any(|m| m.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.available_models.clone())
    }
}
