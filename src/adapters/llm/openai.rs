//! OpenAI extractor - chat-completions implementation of the extraction port.
//!
//! Sends a stable system prompt plus a templated user prompt (master
//! snapshot, recent conversation, state guidance, known product names) at
//! temperature 0 and parses the strict JSON object out of the reply,
//! tolerating markdown code fences.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::configurator::{ConfiguratorState, ConversationRole};
use crate::ports::{Extraction, ExtractionError, ExtractionRequest, ParameterExtractor};

/// Stable bytes: the extraction system prompt.
const SYSTEM_PROMPT: &str = "You are a welding equipment expert. Extract technical \
parameters from the user's message into the strict JSON contract you are given. \
Emit only attributes you are confident about, in their canonical forms. Never \
invent products. Respond with a single JSON object and nothing else.";

/// Configuration for the OpenAI extractor.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-backed parameter extractor.
pub struct OpenAiExtractor {
    config: OpenAiConfig,
    client: Client,
    /// Known product names per master key, embedded into the prompt so the
    /// model recognizes direct mentions. Bounded per kind to keep the prompt
    /// small.
    known_products: BTreeMap<String, Vec<String>>,
}

const KNOWN_PRODUCTS_PER_KIND: usize = 10;

impl OpenAiExtractor {
    pub fn new(config: OpenAiConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractionError::ProviderUnavailable(e.to_string()))?;

        Ok(Self {
            config,
            client,
            known_products: BTreeMap::new(),
        })
    }

    /// Supplies product-name knowledge for the prompt (power sources,
    /// feeders, and coolers are the useful ones).
    pub fn with_known_products(mut self, known: BTreeMap<String, Vec<String>>) -> Self {
        self.known_products = known;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn state_guidance(state: ConfiguratorState) -> &'static str {
        match state {
            ConfiguratorState::PowerSourceSelection => {
                "FOCUS: power_source. Look for process, current, voltage, phase, material, portability."
            }
            ConfiguratorState::FeederSelection => {
                "FOCUS: feeder. Look for process, wire_size, cooling_type, portability, material."
            }
            ConfiguratorState::CoolerSelection => "FOCUS: cooler. Look for cooling_type.",
            ConfiguratorState::InterconnectorSelection => {
                "FOCUS: interconnector. Look for cable_length, current, cooling_type."
            }
            ConfiguratorState::TorchSelection => {
                "FOCUS: torch. Look for process, current, cooling_type."
            }
            ConfiguratorState::AccessoriesSelection => {
                "FOCUS: accessories. Look for accessory_type and cable_length."
            }
            ConfiguratorState::Finalize => {
                "The configuration is being finalized; only extract explicit change requests."
            }
        }
    }

    fn build_user_prompt(&self, request: &ExtractionRequest) -> String {
        let master_json = serde_json::to_string_pretty(&request.master).unwrap_or_default();

        let mut transcript = String::new();
        for entry in &request.recent_log {
            let role = match entry.role {
                ConversationRole::User => "user",
                ConversationRole::Assistant => "assistant",
            };
            transcript.push_str(&format!("{}: {}\n", role, entry.text));
        }

        let mut known = String::new();
        for (kind, names) in &self.known_products {
            if names.is_empty() {
                continue;
            }
            known.push_str(&format!("\n{}:\n", kind));
            for name in names.iter().take(KNOWN_PRODUCTS_PER_KIND) {
                known.push_str(&format!("  - {}\n", name));
            }
            if names.len() > KNOWN_PRODUCTS_PER_KIND {
                known.push_str(&format!(
                    "  ... and {} more\n",
                    names.len() - KNOWN_PRODUCTS_PER_KIND
                ));
            }
        }

        format!(
            r#"USER MESSAGE: "{message}"

CURRENT STATE: {state}
{guidance}

CURRENT MASTER PARAMETERS:
{master_json}

RECENT CONVERSATION:
{transcript}
KNOWN PRODUCT NAMES (for direct mentions):{known}

Return a JSON object with exactly these fields:
- "updates": component key (power_source, feeder, cooler, interconnector, torch, accessories) to an object of attribute -> canonical value. Include only components this message mentions, and only the changed attributes.
- "needs_clarification": boolean.
- "clarification_question": non-empty exactly when needs_clarification is true, else "".
- "direct_product_mentions": component key -> the product name token the user used.
- "confidence": component key -> number in [0, 1].
- "reasoning": optional short trace.

Canonical forms: current "500 A"; voltage "230V"; phase "single-phase" or "3-phase"; process "MIG (GMAW)" style; cooling_type water/air/none; wire_size "0.035 inch"; cable_length "25 ft"; portability portable/stationary; material lowercase.
Never delete or null existing values; emit deltas only."#,
            message = request.user_message,
            state = request.current_state,
            guidance = Self::state_guidance(request.current_state),
        )
    }

    /// Pulls the JSON object out of a reply that may wrap it in markdown
    /// fences or prose.
    fn extract_json(content: &str) -> Result<String, ExtractionError> {
        let trimmed = content.trim();

        for fence in ["```json", "```"] {
            if let Some(start) = trimmed.find(fence) {
                let body = &trimmed[start + fence.len()..];
                if let Some(end) = body.find("```") {
                    return Ok(body[..end].trim().to_string());
                }
            }
        }

        let start = trimmed
            .find('{')
            .ok_or_else(|| ExtractionError::InvalidJson("no JSON object in reply".into()))?;

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, c) in trimmed[start..].char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                _ if in_string => {}
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(trimmed[start..start + offset + 1].to_string());
                    }
                }
                _ => {}
            }
        }
        Err(ExtractionError::InvalidJson("unbalanced JSON object".into()))
    }

    async fn call_once(&self, prompt: &str) -> Result<String, ExtractionError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: prompt.to_string() },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else {
                    ExtractionError::ProviderUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::ProviderUnavailable(format!(
                "status {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractionError::InvalidJson("empty choices".into()))
    }
}

#[async_trait]
impl ParameterExtractor for OpenAiExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError> {
        let prompt = self.build_user_prompt(&request);

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                warn!(attempt, "retrying extraction call");
            }

            match self.call_once(&prompt).await {
                Ok(content) => {
                    let json = Self::extract_json(&content)?;
                    let extraction: Extraction = serde_json::from_str(&json)
                        .map_err(|e| ExtractionError::InvalidJson(e.to_string()))?;
                    extraction.validate()?;
                    debug!(
                        components = extraction.updates.len(),
                        "extraction parsed"
                    );
                    return Ok(extraction);
                }
                // Only transport-level failures are worth retrying.
                Err(err @ ExtractionError::ProviderUnavailable(_))
                | Err(err @ ExtractionError::Timeout { .. }) => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ExtractionError::ProviderUnavailable("no attempts made".into())))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_json() {
        let json = OpenAiExtractor::extract_json(r#"{"updates": {}}"#).unwrap();
        assert_eq!(json, r#"{"updates": {}}"#);
    }

    #[test]
    fn extracts_json_from_fence() {
        let content = "Here you go:\n```json\n{\"updates\": {}}\n```\nDone.";
        let json = OpenAiExtractor::extract_json(content).unwrap();
        assert_eq!(json, r#"{"updates": {}}"#);
    }

    #[test]
    fn extracts_json_from_prose() {
        let content = r#"Based on the message: {"updates": {"cooler": {"cooling_type": "water"}}} as requested"#;
        let json = OpenAiExtractor::extract_json(content).unwrap();
        assert!(json.starts_with('{') && json.ends_with('}'));
        assert!(json.contains("cooling_type"));
    }

    #[test]
    fn balanced_extraction_ignores_braces_in_strings() {
        let content = r#"{"reasoning": "user wrote {500A}", "updates": {}}"#;
        let json = OpenAiExtractor::extract_json(content).unwrap();
        assert_eq!(json, content);
    }

    #[test]
    fn missing_json_is_an_error() {
        assert!(matches!(
            OpenAiExtractor::extract_json("no json here"),
            Err(ExtractionError::InvalidJson(_))
        ));
    }

    #[test]
    fn prompt_includes_state_guidance_and_master() {
        let extractor = OpenAiExtractor::new(OpenAiConfig::new("sk-test")).unwrap();
        let request = ExtractionRequest::new(
            "portable, 0.035",
            ConfiguratorState::FeederSelection,
        );
        let prompt = extractor.build_user_prompt(&request);

        assert!(prompt.contains("FOCUS: feeder"));
        assert!(prompt.contains("portable, 0.035"));
        assert!(prompt.contains("power_source"));
    }

    #[test]
    fn prompt_bounds_known_product_names() {
        let names: Vec<String> = (0..30).map(|i| format!("Model {i}")).collect();
        let mut known = BTreeMap::new();
        known.insert("power_source".to_string(), names);

        let extractor = OpenAiExtractor::new(OpenAiConfig::new("sk-test"))
            .unwrap()
            .with_known_products(known);
        let request = ExtractionRequest::new("hi", ConfiguratorState::PowerSourceSelection);
        let prompt = extractor.build_user_prompt(&request);

        assert!(prompt.contains("Model 9"));
        assert!(!prompt.contains("Model 10\n"));
        assert!(prompt.contains("and 20 more"));
    }
}
