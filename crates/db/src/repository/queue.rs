//! Run queue table operations.
//!
//! The queue is the `run_queue` table read in insertion order. Dequeue
//! deletes the head row and hands it back in one statement; an entry is
//! gone from the table before the caller starts working on it.

use sqlx::PgPool;

use crate::{DbError, models::QueueEntryRow};

/// Append an entry to the tail of the queue.
pub async fn push(pool: &PgPool, payload: serde_json::Value) -> Result<QueueEntryRow, DbError> {
    let row = sqlx::query_as::<_, QueueEntryRow>(
        r#"
        INSERT INTO run_queue (payload)
        VALUES ($1)
        RETURNING id, payload, enqueued_at
        "#,
    )
    .bind(payload)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Remove and return the oldest entry, or `None` if the queue is empty.
///
/// `FOR UPDATE SKIP LOCKED` keeps concurrent consumers from ever receiving
/// the same row.
pub async fn pop(pool: &PgPool) -> Result<Option<QueueEntryRow>, DbError> {
    let row = sqlx::query_as::<_, QueueEntryRow>(
        r#"
        DELETE FROM run_queue
        WHERE id = (
            SELECT id FROM run_queue
            ORDER BY id ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, payload, enqueued_at
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Number of entries currently waiting.
pub async fn len(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM run_queue")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
