//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `ARCFIT` prefix with
//! `__` separating nested sections, e.g. `ARCFIT__SERVER__PORT=8080`.

mod archive;
mod cache;
mod configurator;
mod error;
mod graph;
mod llm;
mod server;

pub use archive::ArchiveConfig;
pub use cache::CacheConfig;
pub use configurator::ConfiguratorConfig;
pub use error::{ConfigError, ValidationError};
pub use graph::GraphConfig;
pub use llm::LlmConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM extraction provider
    pub llm: LlmConfig,

    /// Product graph connection
    pub graph: GraphConfig,

    /// Hot session cache (Redis)
    pub cache: CacheConfig,

    /// Durable archive (PostgreSQL)
    pub archive: ArchiveConfig,

    /// Flow knobs (TTL, thresholds, deadlines)
    #[serde(default)]
    pub configurator: ConfiguratorConfig,
}

impl AppConfig {
    /// Loads configuration from the environment (and `.env` in development).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ARCFIT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.llm.validate()?;
        self.graph.validate()?;
        self.cache.validate()?;
        self.archive.validate()?;
        self.configurator.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("ARCFIT__LLM__API_KEY", "sk-test");
        env::set_var("ARCFIT__GRAPH__URI", "http://localhost:7474");
        env::set_var("ARCFIT__GRAPH__USERNAME", "neo4j");
        env::set_var("ARCFIT__GRAPH__PASSWORD", "secret");
        env::set_var("ARCFIT__CACHE__URL", "redis://localhost:6379");
        env::set_var("ARCFIT__ARCHIVE__DSN", "postgresql://test@localhost/arcfit");
    }

    fn clear_env() {
        for (key, _) in env::vars() {
            if key.starts_with("ARCFIT__") {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn loads_minimal_configuration() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();

        let config = AppConfig::load().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.configurator.session_ttl_seconds, 3600);
        assert_eq!(config.configurator.minimum_real_components, 1);

        clear_env();
    }

    #[test]
    fn overrides_nested_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_minimal_env();
        env::set_var("ARCFIT__SERVER__PORT", "9000");
        env::set_var("ARCFIT__CONFIGURATOR__MINIMUM_REAL_COMPONENTS", "3");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.configurator.minimum_real_components, 3);

        clear_env();
    }

    #[test]
    fn missing_required_section_fails() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        assert!(AppConfig::load().is_err());
    }
}
