//! Sync metadata and the generic sync queue.
//!
//! Two small pieces of bookkeeping the coordinator leans on:
//!
//! - **sync_metadata**: a key/value store of singleton values, primarily the
//!   pull cursor ([`LAST_PULL_SYNC`]). The cursor only moves forward after a
//!   fully successful pull, so a failed pull is retried from the same point.
//! - **sync_queue**: a generic outbox for non-sale mutations. Sales have
//!   their own pending-flag path on `local_sales`; this queue is the
//!   generalization point for future entity types (returns, cash counts).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use mostrador_core::{QueueStatus, SyncQueueEntry};

use crate::error::{DbError, DbResult};

/// Metadata key under which the pull cursor is stored.
pub const LAST_PULL_SYNC: &str = "last_pull_sync";

/// Repository for sync cursors and the generic queue.
#[derive(Debug, Clone)]
pub struct SyncMetaRepository {
    pool: SqlitePool,
}

impl SyncMetaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SyncMetaRepository { pool }
    }

    // =========================================================================
    // Cursor storage
    // =========================================================================

    /// Reads a metadata value, `None` if the key was never written.
    pub async fn get_cursor(&self, key: &str) -> DbResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM sync_metadata WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Writes a metadata value, replacing any previous one.
    pub async fn set_cursor(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, value = %value, "Sync cursor updated");
        Ok(())
    }

    // =========================================================================
    // Generic queue
    // =========================================================================

    /// Enqueues a mutation for later push.
    pub async fn enqueue(
        &self,
        operation: &str,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncQueueEntry> {
        let entry = SyncQueueEntry {
            id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload: payload.to_string(),
            status: QueueStatus::Pending,
            attempts: 0,
            last_attempt: None,
            error: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sync_queue (
                id, operation, entity_type, entity_id, payload,
                status, attempts, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.operation)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.payload)
        .bind(entry.status)
        .bind(entry.attempts)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            id = %entry.id,
            entity_type = %entry.entity_type,
            operation = %entry.operation,
            "Mutation enqueued"
        );
        Ok(entry)
    }

    /// Lists pending queue entries, oldest first, up to `limit`.
    pub async fn list_pending(&self, limit: i64) -> DbResult<Vec<SyncQueueEntry>> {
        let entries = sqlx::query_as::<_, SyncQueueEntry>(
            "SELECT * FROM sync_queue WHERE status = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(QueueStatus::Pending)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Claims a pending entry (`pending → processing`), bumping its attempt
    /// counter and stamping the attempt time.
    pub async fn mark_processing(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = ?, attempts = attempts + 1, last_attempt = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(QueueStatus::Processing)
        .bind(Utc::now())
        .bind(id)
        .bind(QueueStatus::Pending)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending queue entry", id));
        }
        Ok(())
    }

    /// Marks a processing entry completed.
    pub async fn mark_completed(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sync_queue SET status = ?, error = NULL WHERE id = ? AND status = ?",
        )
        .bind(QueueStatus::Completed)
        .bind(id)
        .bind(QueueStatus::Processing)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Processing queue entry", id));
        }
        Ok(())
    }

    /// Marks a processing entry failed, recording the error message.
    pub async fn mark_failed(&self, id: &str, message: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sync_queue SET status = ?, error = ? WHERE id = ? AND status = ?",
        )
        .bind(QueueStatus::Failed)
        .bind(message)
        .bind(id)
        .bind(QueueStatus::Processing)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Processing queue entry", id));
        }
        Ok(())
    }

    /// Counts pending queue entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_queue WHERE status = ?")
            .bind(QueueStatus::Pending)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

/// Parses a stored cursor back into a timestamp.
///
/// A missing or unparsable cursor is treated as "never pulled"; the caller
/// falls back to a full pull.
pub fn parse_cursor(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// Unit Tests
// =============================================================================
