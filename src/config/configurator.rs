//! Flow configuration: TTL, thresholds, deadlines.

use serde::Deserialize;
use std::time::Duration;

use crate::application::OrchestratorConfig;

use super::error::ValidationError;

/// Deployment-time knobs of the S1→S7 flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguratorConfig {
    /// Hot-cache TTL per session, reset on every mutation.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,

    /// Minimum number of selected components required to finalize. The
    /// historical deployment used 3; the current default requires only the
    /// power source.
    #[serde(default = "default_minimum_real_components")]
    pub minimum_real_components: usize,

    /// End-to-end turn deadline.
    #[serde(default = "default_turn_deadline_ms")]
    pub turn_deadline_ms: u64,

    /// Direct-mention matches at or above this extraction confidence commit
    /// without an extra confirmation turn.
    #[serde(default = "default_auto_commit_confidence")]
    pub auto_commit_confidence: f64,

    /// Below this confidence a single match is only presented as an option.
    #[serde(default = "default_confirm_confidence")]
    pub confirm_confidence: f64,

    /// Conversation entries handed to the extractor.
    #[serde(default = "default_recent_log_entries")]
    pub recent_log_entries: usize,

    /// Result cap for proactive next-state suggestions.
    #[serde(default = "default_proactive_limit")]
    pub proactive_limit: usize,

    /// Path to the serialized applicability table. Absent means every
    /// power source defaults to all components applicable.
    #[serde(default)]
    pub applicability_path: Option<String>,
}

impl ConfiguratorConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    /// Builds the orchestrator knobs, pulling the port sub-deadlines from
    /// their own sections.
    pub fn orchestrator_config(
        &self,
        llm_deadline_ms: u64,
        graph_deadline_ms: u64,
    ) -> OrchestratorConfig {
        OrchestratorConfig {
            minimum_real_components: self.minimum_real_components,
            turn_deadline: Duration::from_millis(self.turn_deadline_ms),
            llm_deadline: Duration::from_millis(llm_deadline_ms),
            graph_deadline: Duration::from_millis(graph_deadline_ms),
            auto_commit_confidence: self.auto_commit_confidence,
            confirm_confidence: self.confirm_confidence,
            recent_log_entries: self.recent_log_entries,
            proactive_limit: self.proactive_limit,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_seconds == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.turn_deadline_ms == 0 || self.turn_deadline_ms > 300_000 {
            return Err(ValidationError::InvalidTurnDeadline);
        }
        for confidence in [self.auto_commit_confidence, self.confirm_confidence] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ValidationError::InvalidConfidence);
            }
        }
        Ok(())
    }
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: default_session_ttl(),
            minimum_real_components: default_minimum_real_components(),
            turn_deadline_ms: default_turn_deadline_ms(),
            auto_commit_confidence: default_auto_commit_confidence(),
            confirm_confidence: default_confirm_confidence(),
            recent_log_entries: default_recent_log_entries(),
            proactive_limit: default_proactive_limit(),
            applicability_path: None,
        }
    }
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_minimum_real_components() -> usize {
    1
}

fn default_turn_deadline_ms() -> u64 {
    30_000
}

fn default_auto_commit_confidence() -> f64 {
    0.85
}

fn default_confirm_confidence() -> f64 {
    0.5
}

fn default_recent_log_entries() -> usize {
    6
}

fn default_proactive_limit() -> usize {
    3
}
