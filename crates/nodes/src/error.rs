//! Node-level error types.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// Any `NodeError` fails the node: the engine records it as the node's
/// outcome and stops the run there. Nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The request never produced a response (bad URL, DNS, connect, timeout).
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("request failed with status code {0}")]
    Status(u16),

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// A node definition that decodes as JSON but cannot be executed as written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("node '{node_id}': missing required field '{field}'")]
    MissingField {
        node_id: String,
        field: &'static str,
    },

    #[error("node '{node_id}': invalid '{field}': {reason}")]
    InvalidField {
        node_id: String,
        field: &'static str,
        reason: String,
    },
}
