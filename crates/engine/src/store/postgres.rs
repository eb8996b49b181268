//! Postgres-backed store built on the `db` repository functions.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use db::DbPool;
use db::models::{FlowRow, RunRow};
use db::repository::{flows as flow_repo, runs as run_repo};
use db::DbError;
use nodes::{NodeDefinition, NodeOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{FlowStore, RunStore};
use crate::{EngineError, Flow, ResultMap, Run, RunState};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlowStore for PgStore {
    async fn get_flow(&self, id: Uuid) -> Result<Flow, EngineError> {
        let row = flow_repo::get_flow(&self.pool, id).await.map_err(|e| match e {
            DbError::NotFound => EngineError::FlowNotFound(id),
            other => other.into(),
        })?;
        flow_from_row(row)
    }

    async fn create_flow(&self, name: &str, nodes: Vec<NodeDefinition>) -> Result<Flow, EngineError> {
        let nodes = serde_json::to_value(nodes).map_err(|e| EngineError::InvalidDefinition(e.to_string()))?;
        let row = flow_repo::create_flow(&self.pool, name, nodes).await?;
        flow_from_row(row)
    }

    async fn list_flows(&self) -> Result<Vec<Flow>, EngineError> {
        let rows = flow_repo::list_flows(&self.pool).await?;
        let mut flows = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match flow_from_row(row) {
                Ok(flow) => flows.push(flow),
                Err(e) => warn!(flow_id = %id, error = %e, "skipping undecodable flow"),
            }
        }
        Ok(flows)
    }
}

#[async_trait]
impl RunStore for PgStore {
    async fn create_run(&self, run: &Run) -> Result<(), EngineError> {
        run_repo::create_run(&self.pool, &run_to_row(run)?).await?;
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<Run, EngineError> {
        let row = run_repo::get_run(&self.pool, id).await.map_err(|e| match e {
            DbError::NotFound => EngineError::RunNotFound(id),
            other => other.into(),
        })?;
        run_from_row(row)
    }

    async fn update_run_state(
        &self,
        id: Uuid,
        state: RunState,
        result: Option<&ResultMap>,
    ) -> Result<(), EngineError> {
        let result = result.map(encode_result).transpose()?;

        run_repo::update_run_state(&self.pool, id, state, result)
            .await
            .map_err(|e| match e {
                DbError::NotFound => EngineError::RunNotFound(id),
                DbError::StateConflict { current } => match current.parse::<RunState>() {
                    Ok(from) => EngineError::InvalidTransition { run_id: id, from, to: state },
                    Err(msg) => EngineError::CorruptRecord(msg),
                },
                other => other.into(),
            })
    }
}

fn flow_from_row(row: FlowRow) -> Result<Flow, EngineError> {
    let nodes: Vec<NodeDefinition> = serde_json::from_value(row.nodes)
        .map_err(|e| EngineError::InvalidDefinition(format!("flow {}: {e}", row.id)))?;
    Ok(Flow {
        id: row.id,
        name: row.name,
        version: row.version,
        nodes,
        created_at: row.created_at,
    })
}

fn run_from_row(row: RunRow) -> Result<Run, EngineError> {
    let state = row
        .state
        .parse::<RunState>()
        .map_err(EngineError::CorruptRecord)?;
    let result = decode_result(row.result)
        .map_err(|e| EngineError::CorruptRecord(format!("run {} result: {e}", row.id)))?;
    Ok(Run {
        id: row.id,
        flow_id: row.flow_id,
        version: row.version,
        state,
        payload: row.payload,
        result,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn run_to_row(run: &Run) -> Result<RunRow, EngineError> {
    Ok(RunRow {
        id: run.id,
        flow_id: run.flow_id,
        version: run.version,
        state: run.state.to_string(),
        payload: run.payload.clone(),
        result: encode_result(&run.result)?,
        created_at: run.created_at,
        updated_at: run.updated_at,
    })
}

/// One element of the stored `runs.result` array.
///
/// Postgres `JSONB` (and `serde_json::Value` itself) sorts object keys, so the
/// result is stored as an array of entries to keep execution order.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    node_id: String,
    outcome: NodeOutcome,
}

fn encode_result(result: &ResultMap) -> Result<Value, EngineError> {
    let entries: Vec<StoredEntry> = result
        .iter()
        .map(|(id, outcome)| StoredEntry {
            node_id: id.to_owned(),
            outcome: outcome.clone(),
        })
        .collect();
    serde_json::to_value(entries).map_err(|e| EngineError::CorruptRecord(e.to_string()))
}

fn decode_result(value: Value) -> Result<ResultMap, serde_json::Error> {
    // Object-shaped results carry no order; accept them as-is.
    if value.is_object() {
        return serde_json::from_value(value);
    }
    let entries: Vec<StoredEntry> = serde_json::from_value(value)?;
    let mut result = ResultMap::new();
    for entry in entries {
        result.insert(entry.node_id, entry.outcome);
    }
    Ok(result)
}
