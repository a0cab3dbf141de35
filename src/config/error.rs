//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid graph URI format")]
    InvalidGraphUri,

    #[error("Invalid cache URL format")]
    InvalidCacheUrl,

    #[error("Invalid archive DSN format")]
    InvalidArchiveDsn,

    #[error("Session TTL must be positive")]
    InvalidSessionTtl,

    #[error("Turn deadline must be positive and at most 300000 ms")]
    InvalidTurnDeadline,

    #[error("Confidence thresholds must lie in [0, 1]")]
    InvalidConfidence,

    #[error("LLM temperature is forced to 0 for extraction")]
    NonZeroTemperature,
}
