//! Parameter Extractor Port - LLM-backed extraction under a strict contract.
//!
//! The extractor turns a free-text user message into normalized parameter
//! deltas. The output contract is strict: deltas only for mentioned
//! components, canonical attribute values, a clarification question exactly
//! when clarification is needed. Implementations re-validate everything the
//! model returns; a contract violation is an `ExtractionError`, never a
//! silently accepted value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::catalog::ComponentKind;
use crate::domain::configurator::{
    validate_bag_updates, ConfiguratorState, ConversationEntry, MasterRecord,
};

/// Input to one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub user_message: String,
    pub current_state: ConfiguratorState,
    /// Snapshot of the master record so the model preserves prior values.
    pub master: MasterRecord,
    /// The last N conversation entries, oldest first.
    pub recent_log: Vec<ConversationEntry>,
}

impl ExtractionRequest {
    pub fn new(user_message: impl Into<String>, current_state: ConfiguratorState) -> Self {
        Self {
            user_message: user_message.into(),
            current_state,
            master: MasterRecord::new(),
            recent_log: Vec::new(),
        }
    }

    pub fn with_master(mut self, master: MasterRecord) -> Self {
        self.master = master;
        self
    }

    pub fn with_recent_log(mut self, recent_log: Vec<ConversationEntry>) -> Self {
        self.recent_log = recent_log;
        self
    }
}

/// The strict extraction output object.
///
/// Keys of the per-component maps are master-record keys (`power_source`,
/// `feeder`, ...). Components the turn does not mention are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub updates: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub clarification_question: String,
    #[serde(default)]
    pub direct_product_mentions: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Extraction {
    /// An empty extraction (nothing recognized).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates the whole object against the contract: known component
    /// keys, canonical attribute forms, clarification-question presence, and
    /// confidence bounds.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        for (key, delta) in &self.updates {
            let kind = ComponentKind::from_master_key(key)
                .ok_or_else(|| ExtractionError::contract(format!("unknown component '{key}'")))?;
            validate_bag_updates(kind, delta)
                .map_err(|e| ExtractionError::contract(e.to_string()))?;
        }

        for key in self.direct_product_mentions.keys() {
            if ComponentKind::from_master_key(key).is_none() {
                return Err(ExtractionError::contract(format!(
                    "unknown component '{key}' in direct_product_mentions"
                )));
            }
        }

        if self.needs_clarification && self.clarification_question.trim().is_empty() {
            return Err(ExtractionError::contract(
                "needs_clarification without clarification_question",
            ));
        }
        if !self.needs_clarification && !self.clarification_question.trim().is_empty() {
            return Err(ExtractionError::contract(
                "clarification_question without needs_clarification",
            ));
        }

        for (key, value) in &self.confidence {
            if ComponentKind::from_master_key(key).is_none() {
                return Err(ExtractionError::contract(format!(
                    "unknown component '{key}' in confidence"
                )));
            }
            if !(0.0..=1.0).contains(value) {
                return Err(ExtractionError::contract(format!(
                    "confidence {value} for '{key}' outside [0, 1]"
                )));
            }
        }

        Ok(())
    }

    /// Confidence for one component, defaulting to zero when absent.
    pub fn confidence_for(&self, kind: ComponentKind) -> f64 {
        self.confidence.get(kind.master_key()).copied().unwrap_or(0.0)
    }

    /// The typed (kind, delta, mention) triples of this extraction.
    pub fn component_deltas(
        &self,
    ) -> Vec<(ComponentKind, &BTreeMap<String, String>, Option<&str>)> {
        static EMPTY: once_cell::sync::Lazy<BTreeMap<String, String>> =
            once_cell::sync::Lazy::new(BTreeMap::new);

        let mut keys: Vec<&String> = self.updates.keys().collect();
        for key in self.direct_product_mentions.keys() {
            if !self.updates.contains_key(key) {
                keys.push(key);
            }
        }

        keys.into_iter()
            .filter_map(|key| {
                let kind = ComponentKind::from_master_key(key)?;
                let delta = self.updates.get(key).unwrap_or(&EMPTY);
                let mention = self.direct_product_mentions.get(key).map(String::as_str);
                Some((kind, delta, mention))
            })
            .collect()
    }
}

/// Extraction failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    /// The LLM call itself failed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The call exceeded its sub-deadline.
    #[error("extraction timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The response was not valid JSON.
    #[error("invalid extraction JSON: {0}")]
    InvalidJson(String),

    /// The response violated the output contract.
    #[error("extraction contract violation: {0}")]
    ContractViolation(String),
}

impl ExtractionError {
    pub fn contract(message: impl Into<String>) -> Self {
        ExtractionError::ContractViolation(message.into())
    }
}

/// Port for LLM-backed parameter extraction.
///
/// Stateless: safe to invoke concurrently for different sessions. The
/// orchestrator guarantees it is never invoked concurrently for one session.
#[async_trait]
pub trait ParameterExtractor: Send + Sync {
    /// Extracts normalized parameter deltas from one user message.
    async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction_json(json: &str) -> Extraction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn valid_extraction_passes() {
        let extraction = extraction_json(
            r#"{
                "updates": {"power_source": {"current": "500 A", "process": "MIG (GMAW)"}},
                "needs_clarification": false,
                "direct_product_mentions": {"feeder": "RobustFeed"},
                "confidence": {"power_source": 0.9, "feeder": 0.8}
            }"#,
        );
        assert!(extraction.validate().is_ok());
    }

    #[test]
    fn non_canonical_value_is_a_contract_violation() {
        let extraction = extraction_json(
            r#"{"updates": {"power_source": {"current": "500 amps"}}}"#,
        );
        assert!(matches!(
            extraction.validate(),
            Err(ExtractionError::ContractViolation(_))
        ));
    }

    #[test]
    fn unknown_component_key_is_rejected() {
        let extraction = extraction_json(r#"{"updates": {"helmet": {"material": "steel"}}}"#);
        assert!(extraction.validate().is_err());
    }

    #[test]
    fn clarification_flag_and_question_must_agree() {
        let missing_question = extraction_json(r#"{"needs_clarification": true}"#);
        assert!(missing_question.validate().is_err());

        let stray_question = extraction_json(
            r#"{"needs_clarification": false, "clarification_question": "Which process?"}"#,
        );
        assert!(stray_question.validate().is_err());

        let consistent = extraction_json(
            r#"{"needs_clarification": true, "clarification_question": "Which process?"}"#,
        );
        assert!(consistent.validate().is_ok());
    }

    #[test]
    fn confidence_out_of_bounds_is_rejected() {
        let extraction = extraction_json(r#"{"confidence": {"power_source": 1.5}}"#);
        assert!(extraction.validate().is_err());
    }

    #[test]
    fn component_deltas_include_mention_only_components() {
        let extraction = extraction_json(
            r#"{
                "updates": {"power_source": {"current": "500 A"}},
                "direct_product_mentions": {"cooler": "Cool2"}
            }"#,
        );

        let deltas = extraction.component_deltas();
        assert_eq!(deltas.len(), 2);

        let (kind, delta, mention) = &deltas[1];
        assert_eq!(*kind, ComponentKind::Cooler);
        assert!(delta.is_empty());
        assert_eq!(*mention, Some("Cool2"));
    }

    #[test]
    fn confidence_defaults_to_zero() {
        let extraction = Extraction::empty();
        assert_eq!(extraction.confidence_for(ComponentKind::Torch), 0.0);
    }
}
