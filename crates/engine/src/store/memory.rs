//! In-process flow and run store.
//!
//! Enforces the same lifecycle rules as the Postgres store and additionally
//! keeps every state a run has passed through, so tests can assert how many
//! times a run was written.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use nodes::NodeDefinition;

use crate::store::{FlowStore, RunStore};
use crate::{EngineError, Flow, ResultMap, Run, RunState};

#[derive(Debug, Default)]
pub struct MemoryStore {
    flows: RwLock<HashMap<Uuid, Flow>>,
    runs: RwLock<HashMap<Uuid, Run>>,
    history: RwLock<HashMap<Uuid, Vec<RunState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `flow` as-is, bypassing validation. Returns its id.
    pub async fn insert_flow(&self, flow: Flow) -> Uuid {
        let id = flow.id;
        self.flows.write().await.insert(id, flow);
        id
    }

    pub async fn remove_flow(&self, id: Uuid) -> Option<Flow> {
        self.flows.write().await.remove(&id)
    }

    /// Snapshot of every stored run.
    pub async fn runs(&self) -> Vec<Run> {
        self.runs.read().await.values().cloned().collect()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Every state `id` has been stored in, oldest first.
    pub async fn state_history(&self, id: Uuid) -> Vec<RunState> {
        self.history.read().await.get(&id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn get_flow(&self, id: Uuid) -> Result<Flow, EngineError> {
        self.flows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::FlowNotFound(id))
    }

    async fn create_flow(&self, name: &str, nodes: Vec<NodeDefinition>) -> Result<Flow, EngineError> {
        let flow = Flow::new(name, nodes);
        self.flows.write().await.insert(flow.id, flow.clone());
        Ok(flow)
    }

    async fn list_flows(&self) -> Result<Vec<Flow>, EngineError> {
        let mut flows: Vec<Flow> = self.flows.read().await.values().cloned().collect();
        flows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(flows)
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create_run(&self, run: &Run) -> Result<(), EngineError> {
        self.runs.write().await.insert(run.id, run.clone());
        self.history.write().await.insert(run.id, vec![run.state]);
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<Run, EngineError> {
        self.runs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::RunNotFound(id))
    }

    async fn update_run_state(
        &self,
        id: Uuid,
        state: RunState,
        result: Option<&ResultMap>,
    ) -> Result<(), EngineError> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::RunNotFound(id))?;

        if !run.state.can_transition_to(state) {
            return Err(EngineError::InvalidTransition {
                run_id: id,
                from: run.state,
                to: state,
            });
        }

        run.state = state;
        if let Some(result) = result {
            run.result = result.clone();
        }
        run.updated_at = Utc::now();

        self.history.write().await.entry(id).or_default().push(state);
        Ok(())
    }
}
