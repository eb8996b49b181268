//! Flow definition operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::FlowRow};

/// Insert a new flow at version 1.
///
/// `nodes` must be the JSON array produced by serialising the decoded node
/// list; the caller validates it first.
pub async fn create_flow(
    pool: &PgPool,
    name: &str,
    nodes: serde_json::Value,
) -> Result<FlowRow, DbError> {
    let row = sqlx::query_as::<_, FlowRow>(
        r#"
        INSERT INTO flows (id, name, version, nodes, created_at)
        VALUES ($1, $2, 1, $3, $4)
        RETURNING id, name, version, nodes, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(nodes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single flow by its primary key.
pub async fn get_flow(pool: &PgPool, id: Uuid) -> Result<FlowRow, DbError> {
    sqlx::query_as::<_, FlowRow>(
        r#"SELECT id, name, version, nodes, created_at FROM flows WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Return all flows ordered by creation time (newest first).
pub async fn list_flows(pool: &PgPool) -> Result<Vec<FlowRow>, DbError> {
    let rows = sqlx::query_as::<_, FlowRow>(
        r#"SELECT id, name, version, nodes, created_at FROM flows ORDER BY created_at DESC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
