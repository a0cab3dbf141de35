//! Hot session cache configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Redis connection settings for the session cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis URL, e.g. `redis://localhost:6379`
    pub url: String,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidCacheUrl);
        }
        Ok(())
    }
}
