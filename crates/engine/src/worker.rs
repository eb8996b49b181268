//! Consumer side: the long-lived loop that drains the run queue.
//!
//! A `Worker` polls its queue, and for each run id it receives loads the run
//! and its flow, moves the run to `running`, executes the nodes and stores
//! the terminal state. Any number of workers may share a queue and store;
//! each run id is delivered to one of them.
//!
//! A dequeued id is already gone from the queue. If the process dies before
//! the terminal write, the run keeps its `queued` or `running` state and is
//! never picked up again.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use queue::RunQueue;

use crate::executor::{Execution, NodeExecutor};
use crate::store::{FlowStore, RunStore};
use crate::{EngineError, RunState};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Poll timing for a worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause after finding the queue empty.
    pub idle_interval: Duration,
    /// Pause after a job fails with an infrastructure error.
    pub error_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_millis(500),
            error_backoff: Duration::from_millis(1000),
        }
    }
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The queue was empty.
    Idle,
    /// A run was executed and its terminal state stored.
    Processed { run_id: Uuid, state: RunState },
    /// The id was dequeued but there was nothing to execute (no such run,
    /// or the run had already left `queued`).
    Skipped { run_id: Uuid },
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Worker {
    flows: Arc<dyn FlowStore>,
    runs: Arc<dyn RunStore>,
    queue: Arc<dyn RunQueue>,
    executor: NodeExecutor,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        flows: Arc<dyn FlowStore>,
        runs: Arc<dyn RunStore>,
        queue: Arc<dyn RunQueue>,
        executor: NodeExecutor,
        config: WorkerConfig,
    ) -> Self {
        Self { flows, runs, queue, executor, config }
    }

    /// Poll until `shutdown` fires.
    ///
    /// Job failures are logged and followed by `error_backoff`; they never end
    /// the loop. Shutdown is only observed between jobs, so a run that has
    /// started always finishes.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("worker started, polling run queue");

        while !shutdown.is_cancelled() {
            let pause = match self.poll_once().await {
                Ok(PollOutcome::Idle) => Some(self.config.idle_interval),
                Ok(_) => None,
                Err(e) => {
                    error!(error = %e, "worker error");
                    Some(self.config.error_backoff)
                }
            };

            if let Some(pause) = pause {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        info!("worker stopped");
    }

    /// Take at most one run off the queue and process it.
    pub async fn poll_once(&self) -> Result<PollOutcome, EngineError> {
        match self.queue.dequeue().await? {
            Some(run_id) => self.process(run_id).await,
            None => Ok(PollOutcome::Idle),
        }
    }

    /// Execute one run end to end.
    #[instrument(skip(self))]
    pub async fn process(&self, run_id: Uuid) -> Result<PollOutcome, EngineError> {
        let run = match self.runs.get_run(run_id).await {
            Ok(run) => run,
            Err(EngineError::RunNotFound(_)) => {
                warn!("dequeued run has no record; dropping");
                return Ok(PollOutcome::Skipped { run_id });
            }
            Err(e) => return Err(e),
        };

        if run.state != RunState::Queued {
            warn!(state = %run.state, "dequeued run is not queued; skipping");
            return Ok(PollOutcome::Skipped { run_id });
        }

        let nodes = match self.flows.get_flow(run.flow_id).await {
            Ok(flow) => {
                if flow.version != run.version {
                    debug!(
                        run_version = run.version,
                        flow_version = flow.version,
                        "flow changed since trigger; running current definition"
                    );
                }
                Some(flow.nodes)
            }
            Err(e @ (EngineError::FlowNotFound(_) | EngineError::InvalidDefinition(_))) => {
                warn!(error = %e, "flow unavailable; failing run");
                None
            }
            Err(e) => return Err(e),
        };

        self.runs.update_run_state(run_id, RunState::Running, None).await?;

        let execution = match nodes {
            Some(nodes) => self.executor.execute(&run, &nodes).await,
            None => Execution::failed_before_start(),
        };

        self.runs
            .update_run_state(run_id, execution.state, Some(&execution.result))
            .await?;

        info!(state = %execution.state, nodes_run = execution.result.len(), "run finished");
        Ok(PollOutcome::Processed { run_id, state: execution.state })
    }
}
