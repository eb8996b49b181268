//! Node execution for a single run.
//!
//! `NodeExecutor` walks a flow's node list in index order:
//! 1. Each known node runs through its `ExecutableNode` implementation with
//!    the run's payload in the shared `ExecutionContext`.
//! 2. Every executed node gets exactly one entry in the result map.
//! 3. The first failing node ends the run as `failed`; later nodes never run.
//! 4. Nodes of unknown type are skipped with a warning and leave no entry.
//!
//! Node failures never surface as `Err`: they are part of the result.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use nodes::{ExecutionContext, HttpCaller, NodeDefinition, NodeOutcome};

use crate::{ResultMap, Run, RunState};

/// Terminal state and per-node results of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Always `Completed` or `Failed`.
    pub state: RunState,
    pub result: ResultMap,
}

impl Execution {
    /// A run that could not start because its node list was unavailable.
    pub fn failed_before_start() -> Self {
        Self {
            state: RunState::Failed,
            result: ResultMap::new(),
        }
    }
}

/// Runs node lists. Holds only shared resource handles, so one executor can
/// serve any number of runs concurrently.
#[derive(Clone)]
pub struct NodeExecutor {
    http: Arc<dyn HttpCaller>,
}

impl NodeExecutor {
    pub fn new(http: Arc<dyn HttpCaller>) -> Self {
        Self { http }
    }

    /// Execute `nodes` for `run` and return the terminal state and results.
    #[instrument(skip(self, run, nodes), fields(run_id = %run.id, flow_id = %run.flow_id))]
    pub async fn execute(&self, run: &Run, nodes: &[NodeDefinition]) -> Execution {
        let ctx = ExecutionContext {
            flow_id: run.flow_id,
            run_id: run.id,
            payload: run.payload.clone(),
            http: Arc::clone(&self.http),
        };

        let mut result = ResultMap::new();
        let mut state = RunState::Completed;

        for node in nodes {
            let Some(executable) = node.kind.as_executable() else {
                warn!(
                    node_id = %node.id,
                    node_type = node.kind.type_name(),
                    "skipping node of unknown type"
                );
                continue;
            };

            let outcome = match executable.execute(&ctx).await {
                Ok(outcome) => outcome,
                Err(e) => NodeOutcome::error(e.to_string()),
            };

            let failed = outcome.is_error();
            if failed {
                error!(node_id = %node.id, error = ?outcome.error, "node failed");
            } else {
                info!(node_id = %node.id, node_type = node.kind.type_name(), "node succeeded");
            }
            result.insert(node.id.clone(), outcome);

            if failed {
                state = RunState::Failed;
                break;
            }
        }

        Execution { state, result }
    }
}
