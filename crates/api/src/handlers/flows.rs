use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::ApiError;
use engine::Flow;

#[derive(serde::Deserialize)]
pub struct CreateFlowDto {
    pub name: String,
    #[serde(default = "empty_nodes")]
    pub nodes: Value,
}

fn empty_nodes() -> Value {
    Value::Array(Vec::new())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Flow>>, ApiError> {
    Ok(Json(state.flows.list_flows().await?))
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Flow>, ApiError> {
    Ok(Json(state.flows.get_flow(id).await?))
}

/// Decode and validate the node list before anything is stored; unknown
/// node types are rejected here.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlowDto>,
) -> Result<(StatusCode, Json<Flow>), ApiError> {
    let nodes = engine::parse_nodes(payload.nodes)?;
    let flow = state.flows.create_flow(&payload.name, nodes).await?;
    info!(flow_id = %flow.id, nodes = flow.nodes.len(), "flow created");
    Ok((StatusCode::CREATED, Json(flow)))
}
