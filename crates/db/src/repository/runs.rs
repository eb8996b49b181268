//! Run record operations.
//!
//! State updates are conditional on the row's current state so the
//! `queued → running → terminal` lifecycle cannot be violated by a stale or
//! duplicate writer.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, RunState, models::RunRow};

/// Insert a run row exactly as given.
pub async fn create_run(pool: &PgPool, run: &RunRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO runs (id, flow_id, version, state, payload, result, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(run.id)
    .bind(run.flow_id)
    .bind(run.version)
    .bind(&run.state)
    .bind(&run.payload)
    .bind(&run.result)
    .bind(run.created_at)
    .bind(run.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a single run by its primary key.
pub async fn get_run(pool: &PgPool, id: Uuid) -> Result<RunRow, DbError> {
    sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, flow_id, version, state, payload, result, created_at, updated_at
        FROM runs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Move a run into `state`, optionally replacing its result.
///
/// The update only applies when the run currently sits in one of
/// `state.predecessors()`.
///
/// # Errors
/// - [`DbError::NotFound`] if no run has this id.
/// - [`DbError::StateConflict`] if the run exists but cannot move to `state`.
pub async fn update_run_state(
    pool: &PgPool,
    id: Uuid,
    state: RunState,
    result: Option<serde_json::Value>,
) -> Result<(), DbError> {
    let allowed: Vec<String> = state
        .predecessors()
        .iter()
        .map(|s| s.as_str().to_owned())
        .collect();

    let updated = sqlx::query(
        r#"
        UPDATE runs
        SET state = $1, result = COALESCE($2, result), updated_at = $3
        WHERE id = $4 AND state = ANY($5)
        "#,
    )
    .bind(state.as_str())
    .bind(result)
    .bind(Utc::now())
    .bind(id)
    .bind(allowed)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 1 {
        return Ok(());
    }

    let current: Option<String> = sqlx::query_scalar("SELECT state FROM runs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match current {
        Some(current) => Err(DbError::StateConflict { current }),
        None => Err(DbError::NotFound),
    }
}
