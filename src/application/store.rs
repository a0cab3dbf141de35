//! Session lifecycle on top of the cache and archive ports.
//!
//! The hot cache holds the working copy with a TTL that resets on every
//! mutation; the archive receives terminal snapshots. Archive writes are
//! best-effort: a failure is logged and the turn succeeds anyway.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::configurator::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::{ConfigurationArchive, SessionCache, SessionStoreError};

/// Session store with TTL semantics and terminal archival.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn SessionCache>,
    archive: Arc<dyn ConfigurationArchive>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        archive: Arc<dyn ConfigurationArchive>,
        ttl: Duration,
    ) -> Self {
        Self { cache, archive, ttl }
    }

    /// Reads a session snapshot; `None` means expired or unknown.
    pub async fn get(&self, id: SessionId) -> Result<Option<SessionState>, SessionStoreError> {
        self.cache.get(id).await
    }

    /// Persists a snapshot, resetting its TTL.
    pub async fn put(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        self.cache.put(state, self.ttl).await
    }

    /// Removes a session (explicit reset). Idempotent.
    pub async fn reset(&self, id: SessionId) -> Result<(), SessionStoreError> {
        self.cache.delete(id).await
    }

    /// Archives a terminal snapshot. Best-effort: failures are logged, never
    /// propagated.
    pub async fn archive(&self, state: &SessionState) {
        match self.archive.put(state).await {
            Ok(()) => debug!(session_id = %state.session_id, "session archived"),
            Err(err) => {
                warn!(session_id = %state.session_id, error = %err, "archive write failed")
            }
        }
    }

    /// Configured TTL (for health reporting).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
