//! Session persistence ports: hot cache and durable archive.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::configurator::SessionState;
use crate::domain::foundation::SessionId;

/// Hot-cache failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session cache unavailable: {0}")]
    Unavailable(String),

    #[error("session snapshot (de)serialization failed: {0}")]
    Serialization(String),
}

/// Archive failures. Archive writes are best-effort: callers log these and
/// keep going.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive unavailable: {0}")]
    Unavailable(String),

    #[error("archive write failed: {0}")]
    WriteFailed(String),
}

/// Port for the hot session cache.
///
/// A `get` miss means the session expired (or never existed); the caller
/// treats both the same way and starts fresh. Implementations must tolerate
/// concurrent access across distinct session ids; per-id serialization is
/// the orchestrator's job.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Reads a session snapshot. `None` = not found or expired.
    async fn get(&self, id: SessionId) -> Result<Option<SessionState>, SessionStoreError>;

    /// Writes a session snapshot, resetting its TTL.
    async fn put(&self, state: &SessionState, ttl: Duration) -> Result<(), SessionStoreError>;

    /// Removes a session (explicit reset).
    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError>;
}

/// Port for the durable archive of terminal sessions. Writes are idempotent
/// by session id.
#[async_trait]
pub trait ConfigurationArchive: Send + Sync {
    async fn put(&self, state: &SessionState) -> Result<(), ArchiveError>;
}
