//! Producer side: turn a trigger into a queued run.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use queue::RunQueue;

use crate::store::{FlowStore, RunStore};
use crate::{EngineError, Run};

/// Creates run records and hands their ids to the queue.
#[derive(Clone)]
pub struct Dispatcher {
    flows: Arc<dyn FlowStore>,
    runs: Arc<dyn RunStore>,
    queue: Arc<dyn RunQueue>,
}

impl Dispatcher {
    pub fn new(flows: Arc<dyn FlowStore>, runs: Arc<dyn RunStore>, queue: Arc<dyn RunQueue>) -> Self {
        Self { flows, runs, queue }
    }

    /// Create a `queued` run of `flow_id` for `payload` and enqueue it.
    ///
    /// The run record is written before the queue entry, so no consumer can
    /// see an id whose record does not exist yet. The two writes are not
    /// atomic: if the enqueue fails the run stays `queued` with nothing
    /// pointing at it, and the error is returned.
    ///
    /// # Errors
    /// - [`EngineError::FlowNotFound`] if the flow does not exist (no run is
    ///   created).
    /// - [`EngineError::Database`] / [`EngineError::Queue`] on infrastructure
    ///   failure; the caller may retry.
    #[instrument(skip(self, payload))]
    pub async fn submit(&self, flow_id: Uuid, payload: Value) -> Result<Uuid, EngineError> {
        let flow = self.flows.get_flow(flow_id).await?;

        let run = Run::queued(&flow, payload);
        self.runs.create_run(&run).await?;

        if let Err(e) = self.queue.enqueue(run.id).await {
            warn!(run_id = %run.id, error = %e, "run recorded but not enqueued");
            return Err(e.into());
        }

        info!(run_id = %run.id, version = flow.version, "run queued");
        Ok(run.id)
    }
}
