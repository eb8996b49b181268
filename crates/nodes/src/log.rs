//! `log` node.

use async_trait::async_trait;
use tracing::info;

use crate::{ExecutableNode, ExecutionContext, NodeError, NodeOutcome};

/// Writes a line to the operational log. Never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogNode {
    /// Logged verbatim; when absent the run payload is logged as JSON.
    pub message: Option<String>,
}

impl LogNode {
    /// The text this node would log for `ctx`.
    pub fn render(&self, ctx: &ExecutionContext) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => ctx.payload.to_string(),
        }
    }
}

#[async_trait]
impl ExecutableNode for LogNode {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<NodeOutcome, NodeError> {
        info!(target: "flowrun::run", run_id = %ctx.run_id, "log: {}", self.render(ctx));
        Ok(NodeOutcome::ok())
    }
}
