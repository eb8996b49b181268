use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::AppState;
use crate::ApiError;
use engine::Run;

/// Trigger a run. The whole request body is the run payload; an empty body
/// counts as `{}`, anything else must be valid JSON.
pub async fn trigger(
    Path(flow_id): Path<Uuid>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = parse_payload(&body)?;
    let run_id = state.dispatcher.submit(flow_id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "runId": run_id }))))
}

fn parse_payload(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Run>, ApiError> {
    Ok(Json(state.runs.get_run(id).await?))
}
