//! LLM extraction provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for the parameter-extraction LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Provider API key
    pub api_key: Secret<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Extraction requires determinism; anything but 0
    /// fails validation.
    #[serde(default)]
    pub temperature: f32,

    /// Base URL of the chat-completions endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call deadline in milliseconds
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl LlmConfig {
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key().is_empty() {
            return Err(ValidationError::MissingRequired("llm.api_key"));
        }
        if self.temperature != 0.0 {
            return Err(ValidationError::NonZeroTemperature);
        }
        Ok(())
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_deadline_ms() -> u64 {
    10_000
}
