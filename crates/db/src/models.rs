//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models. [`RunState`] lives here because both run
//! stores enforce its transition table.
//! Domain types live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// flows
// ---------------------------------------------------------------------------

/// A persisted flow definition row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlowRow {
    pub id: Uuid,
    pub name: String,
    pub version: i32,
    /// Ordered JSON array of node definitions.
    pub nodes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// runs
// ---------------------------------------------------------------------------

/// Lifecycle state of a run.
///
/// `Queued → Running → (Completed | Failed)`; the two terminal states are
/// sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// States a run must currently be in to move into `self`.
    pub fn predecessors(self) -> &'static [RunState] {
        match self {
            Self::Queued => &[],
            Self::Running => &[Self::Queued],
            Self::Completed | Self::Failed => &[Self::Running],
        }
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        next.predecessors().contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued"    => Ok(Self::Queued),
            "running"   => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed"    => Ok(Self::Failed),
            other       => Err(format!("unknown run state: {other}")),
        }
    }
}

/// A persisted run row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunRow {
    pub id: Uuid,
    pub flow_id: Uuid,
    pub version: i32,
    pub state: String,
    pub payload: serde_json::Value,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// run_queue
// ---------------------------------------------------------------------------

/// A queue entry as it was removed from the `run_queue` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntryRow {
    pub id: i64,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}
