//! `delay` node.

use std::time::Duration;

use async_trait::async_trait;

use crate::{ExecutableNode, ExecutionContext, NodeError, NodeOutcome};

/// Milliseconds slept when a delay node doesn't say.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Suspends the run for `ms` milliseconds. Never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayNode {
    pub ms: u64,
}

impl Default for DelayNode {
    fn default() -> Self {
        Self { ms: DEFAULT_DELAY_MS }
    }
}

#[async_trait]
impl ExecutableNode for DelayNode {
    async fn execute(&self, _ctx: &ExecutionContext) -> Result<NodeOutcome, NodeError> {
        tokio::time::sleep(Duration::from_millis(self.ms)).await;
        Ok(NodeOutcome::slept(self.ms))
    }
}
