//! Arcfit server binary.
//!
//! Loads configuration, wires adapters to ports, and serves the configurator
//! over HTTP.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arcfit::adapters::graph::{Neo4jConfig, Neo4jProductRepository};
use arcfit::adapters::http::{router, AppState, Readiness};
use arcfit::adapters::llm::{OpenAiConfig, OpenAiExtractor};
use arcfit::adapters::postgres::PostgresArchive;
use arcfit::adapters::redis::RedisSessionCache;
use arcfit::application::{Orchestrator, SessionStore};
use arcfit::config::AppConfig;
use arcfit::domain::configurator::ApplicabilityTable;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let applicability = match &config.configurator.applicability_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            let table = ApplicabilityTable::from_json_str(&raw)?;
            info!(path, entries = table.len(), "applicability table loaded");
            Arc::new(table)
        }
        None => {
            info!("no applicability table configured; defaulting to all-Y");
            Arc::new(ApplicabilityTable::default())
        }
    };

    let extractor = Arc::new(OpenAiExtractor::new(
        OpenAiConfig::new(config.llm.api_key())
            .with_model(config.llm.model.clone())
            .with_base_url(config.llm.base_url.clone())
            .with_timeout(Duration::from_millis(config.llm.deadline_ms)),
    )?);

    let repository = Arc::new(Neo4jProductRepository::new(
        Neo4jConfig::new(
            config.graph.uri.clone(),
            config.graph.username.clone(),
            config.graph.password(),
        )
        .with_database(config.graph.database.clone())
        .with_timeout(Duration::from_millis(config.graph.deadline_ms)),
    )?);

    let cache = Arc::new(RedisSessionCache::connect(&config.cache.url).await?);

    let pool = PgPoolOptions::new()
        .max_connections(config.archive.max_connections)
        .connect_lazy(&config.archive.dsn)?;
    let archive = Arc::new(PostgresArchive::new(pool));

    let store = SessionStore::new(cache, archive, config.configurator.session_ttl());
    let orchestrator = Arc::new(Orchestrator::new(
        extractor,
        repository,
        store,
        applicability,
        config
            .configurator
            .orchestrator_config(config.llm.deadline_ms, config.graph.deadline_ms),
    ));

    let state = AppState {
        orchestrator,
        readiness: Readiness {
            llm: true,
            graph: true,
            cache: true,
            archive: true,
        },
    };

    let addr = config.server.socket_addr()?;
    info!(%addr, "arcfit listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
