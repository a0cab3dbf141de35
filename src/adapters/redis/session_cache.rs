//! Redis-backed hot session cache.
//!
//! One key per session (`session:<id>`), value = the full JSON snapshot,
//! written with `SET ... EX` so every mutation resets the TTL. A missing key
//! reads as an expired session.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::domain::configurator::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionCache, SessionStoreError};

/// Session cache on a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisSessionCache {
    conn: MultiplexedConnection,
}

impl RedisSessionCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Connects from a Redis URL.
    pub async fn connect(url: &str) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn get(&self, id: SessionId) -> Result<Option<SessionState>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(id.cache_key())
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        match raw {
            None => {
                debug!(session_id = %id, "cache miss");
                Ok(None)
            }
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SessionStoreError::Serialization(e.to_string())),
        }
    }

    async fn put(&self, state: &SessionState, ttl: Duration) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(state)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(state.session_id.cache_key(), json, ttl.as_secs())
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        debug!(session_id = %state.session_id, ttl_secs = ttl.as_secs(), "session cached");
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(id.cache_key())
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))
    }
}
