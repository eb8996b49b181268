//! The `ExecutableNode` trait: the contract every node must fulfil.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{NodeError, NodeOutcome, http::HttpCaller};

/// Shared context passed to every node of a run.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Flow the run belongs to.
    pub flow_id: Uuid,
    /// The run being executed.
    pub run_id: Uuid,
    /// Payload supplied by the trigger caller; every node sees the same value.
    pub payload: Value,
    /// Outbound HTTP handle used by `http_request` nodes.
    pub http: Arc<dyn HttpCaller>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("flow_id", &self.flow_id)
            .field("run_id", &self.run_id)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Run the node's side effect and describe what happened.
    ///
    /// An `Err` fails the node; the engine turns it into an error outcome.
    async fn execute(&self, ctx: &ExecutionContext) -> Result<NodeOutcome, NodeError>;
}
