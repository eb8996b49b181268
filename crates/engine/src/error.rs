//! Engine-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::RunState;

/// Errors produced by the run engine (validation, lookups, persistence).
///
/// Node failures are not here: they are recorded in the run's result map.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Validation errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// A node was given an empty ID.
    #[error("node at position {0} has an empty ID")]
    EmptyNodeId(usize),

    /// A node's `type` is not one of the built-ins.
    #[error("node '{node_id}' has unknown type '{node_type}'")]
    UnknownNodeType {
        node_id: String,
        node_type: String,
    },

    /// A stored or submitted definition could not be decoded.
    #[error("invalid flow definition: {0}")]
    InvalidDefinition(String),

    // ------ Lookup errors ------

    #[error("flow {0} not found")]
    FlowNotFound(Uuid),

    #[error("run {0} not found")]
    RunNotFound(Uuid),

    // ------ Lifecycle errors ------

    /// The run's current state does not allow moving to `to`.
    #[error("run {run_id} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        run_id: Uuid,
        from: RunState,
        to: RunState,
    },

    /// A stored row holds a value the engine cannot interpret.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    // ------ Infrastructure errors ------

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),

    /// The run queue could not be reached or returned garbage.
    #[error(transparent)]
    Queue(#[from] queue::QueueError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FlowNotFound(_) | Self::RunNotFound(_))
    }

    /// Transient infrastructure trouble; the caller may retry.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Queue(_))
    }
}
