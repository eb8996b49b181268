//! Storage seams for flows and runs.
//!
//! The engine only talks to these traits. [`PgStore`] is the production
//! implementation; [`MemoryStore`] backs tests and single-process use.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use nodes::NodeDefinition;

use crate::{EngineError, Flow, ResultMap, Run, RunState};

/// Flow definitions. Read-only from the engine's point of view; the create
/// and list operations serve the API layer.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// # Errors
    /// [`EngineError::FlowNotFound`] if absent, [`EngineError::InvalidDefinition`]
    /// if the stored node list does not decode.
    async fn get_flow(&self, id: Uuid) -> Result<Flow, EngineError>;

    /// Persist a new flow at version 1. The caller validates `nodes`.
    async fn create_flow(&self, name: &str, nodes: Vec<NodeDefinition>) -> Result<Flow, EngineError>;

    async fn list_flows(&self) -> Result<Vec<Flow>, EngineError>;
}

/// Run records. The engine owns every write to them.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(&self, run: &Run) -> Result<(), EngineError>;

    /// # Errors
    /// [`EngineError::RunNotFound`] if absent.
    async fn get_run(&self, id: Uuid) -> Result<Run, EngineError>;

    /// Move a run to `state`, replacing its result when one is given.
    ///
    /// # Errors
    /// - [`EngineError::RunNotFound`] if absent.
    /// - [`EngineError::InvalidTransition`] if the run's current state does
    ///   not allow it (terminal states never change).
    async fn update_run_state(
        &self,
        id: Uuid,
        state: RunState,
        result: Option<&ResultMap>,
    ) -> Result<(), EngineError>;
}
