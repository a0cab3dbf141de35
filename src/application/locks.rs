//! Per-session mutation locks.
//!
//! All mutations for one session id are serialized by an async mutex keyed
//! by the id; distinct sessions proceed fully in parallel. Lock entries are
//! pruned opportunistically once nobody else holds them.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

/// Registry of per-session mutation locks.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<SessionId, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the mutation lock for a session, waiting behind any turn
    /// already in flight for the same id.
    pub async fn acquire(&self, id: SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Drop entries nobody is waiting on before growing the map.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked lock entries (for tests and health reporting).
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}
