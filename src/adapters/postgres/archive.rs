//! PostgreSQL archive of terminal sessions.
//!
//! One row per session id, upserted so the write is idempotent. The
//! snapshot is stored verbatim as JSONB; the archive never interprets it.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS configurations (
//!     session_id  UUID PRIMARY KEY,
//!     snapshot    JSONB NOT NULL,
//!     archived_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::domain::configurator::SessionState;
use crate::ports::{ArchiveError, ConfigurationArchive};

/// sqlx-backed archive writer.
#[derive(Clone)]
pub struct PostgresArchive {
    pool: PgPool,
}

impl PostgresArchive {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigurationArchive for PostgresArchive {
    async fn put(&self, state: &SessionState) -> Result<(), ArchiveError> {
        let snapshot = serde_json::to_value(state)
            .map_err(|e| ArchiveError::WriteFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO configurations (session_id, snapshot, archived_at)
            VALUES ($1, $2, now())
            ON CONFLICT (session_id)
            DO UPDATE SET snapshot = EXCLUDED.snapshot, archived_at = now()
            "#,
        )
        .bind(state.session_id.as_uuid())
        .bind(snapshot)
        .execute(&self.pool)
        .await
        .map_err(|e| ArchiveError::Unavailable(e.to_string()))?;

        debug!(session_id = %state.session_id, "configuration archived");
        Ok(())
    }
}
