//! Product graph connection configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Connection settings for the Neo4j product graph (HTTP transactional API).
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Base URI, e.g. `http://localhost:7474`
    pub uri: String,

    pub username: String,

    pub password: Secret<String>,

    /// Database name within the server
    #[serde(default = "default_database")]
    pub database: String,

    /// Per-query deadline in milliseconds
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl GraphConfig {
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.uri.starts_with("http://") && !self.uri.starts_with("https://") {
            return Err(ValidationError::InvalidGraphUri);
        }
        if self.username.is_empty() {
            return Err(ValidationError::MissingRequired("graph.username"));
        }
        Ok(())
    }
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_deadline_ms() -> u64 {
    3_000
}
