//! `nodes` crate: node definitions, the `ExecutableNode` trait, and the
//! three built-in node types.
//!
//! A flow's node list decodes into [`NodeDefinition`]s; each known
//! [`NodeKind`] hands the engine an [`ExecutableNode`] to run.

pub mod error;
pub mod traits;
pub mod outcome;
pub mod definition;
pub mod http;
pub mod delay;
pub mod log;
pub mod mock;

pub use error::{DefinitionError, NodeError};
pub use traits::{ExecutableNode, ExecutionContext};
pub use outcome::{NodeOutcome, OutcomeStatus};
pub use definition::{NodeDefinition, NodeKind, RawNode};
pub use http::{HttpCaller, HttpCallerConfig, HttpRequestNode, ReqwestCaller};
pub use delay::DelayNode;
pub use log::LogNode;

pub use reqwest::Method;
