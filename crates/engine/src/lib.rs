//! `engine` crate: domain models, flow validation, storage seams, and the
//! run pipeline: [`Dispatcher`] → queue → [`Worker`] → [`NodeExecutor`].

pub mod models;
pub mod error;
pub mod validate;
pub mod store;
pub mod executor;
pub mod dispatcher;
pub mod worker;

pub use models::{Flow, ResultMap, Run, RunState};
pub use error::EngineError;
pub use validate::{parse_nodes, validate_nodes};
pub use store::{FlowStore, MemoryStore, PgStore, RunStore};
pub use executor::{Execution, NodeExecutor};
pub use dispatcher::Dispatcher;
pub use worker::{PollOutcome, Worker, WorkerConfig};
