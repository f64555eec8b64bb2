use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::llm::DEFAULT_OLLAMA_URL;

/// Application-level constants
pub const APP_NAME: &str = "Evolnote";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Get the application data directory: the platform data dir (or the
/// current directory when none exists) joined with `Evolnote`.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// SQLite file holding the note history, the offline queue and drafts.
pub fn database_path() -> PathBuf {
    app_data_dir().join("evolnote.db")
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "evolnote_lib=debug,info"
    } else {
        "evolnote_lib=info,warn"
    }
}

// ═══════════════════════════════════════════════════════════
// Generation settings
// ═══════════════════════════════════════════════════════════

/// Runtime knobs of the generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSettings {
    /// When false, generation always goes to the service, even offline.
    pub offline_queue_enabled: bool,
    pub ollama_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            offline_queue_enabled: true,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GenerationSettings {
    /// Defaults overridden by `EVOLNOTE_OLLAMA_URL`, `EVOLNOTE_MODEL`,
    /// `EVOLNOTE_TIMEOUT_SECS` and `EVOLNOTE_OFFLINE_QUEUE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(url) = lookup("EVOLNOTE_OLLAMA_URL").filter(|v| !v.trim().is_empty()) {
            settings.ollama_url = url.trim().to_string();
        }
        if let Some(model) = lookup("EVOLNOTE_MODEL").filter(|v| !v.trim().is_empty()) {
            settings.model = model.trim().to_string();
        }
        if let Some(raw) = lookup("EVOLNOTE_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid EVOLNOTE_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("EVOLNOTE_OFFLINE_QUEUE") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => settings.offline_queue_enabled = true,
                "0" | "false" | "off" | "no" => settings.offline_queue_enabled = false,
                _ => tracing::warn!(value = %raw, "Ignoring invalid EVOLNOTE_OFFLINE_QUEUE"),
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn database_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("evolnote.db"));
    }

    #[test]
    fn defaults_enable_offline_queue() {
        let settings = GenerationSettings::default();
        assert!(settings.offline_queue_enabled);
        assert_eq!(settings.ollama_url, DEFAULT_OLLAMA_URL);
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn env_overrides_apply() {
        let settings = GenerationSettings::from_lookup(lookup(&[
            ("EVOLNOTE_OLLAMA_URL", "http://gpu-box:11434"),
            ("EVOLNOTE_MODEL", "mistral:7b"),
            ("EVOLNOTE_TIMEOUT_SECS", "30"),
            ("EVOLNOTE_OFFLINE_QUEUE", "off"),
        ]));
        assert_eq!(settings.ollama_url, "http://gpu-box:11434");
        assert_eq!(settings.model, "mistral:7b");
        assert_eq!(settings.timeout_secs, 30);
        assert!(!settings.offline_queue_enabled);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let settings = GenerationSettings::from_lookup(lookup(&[
            ("EVOLNOTE_TIMEOUT_SECS", "0"),
            ("EVOLNOTE_OFFLINE_QUEUE", "peut-être"),
            ("EVOLNOTE_MODEL", "  "),
        ]));
        assert_eq!(settings, GenerationSettings::default());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
