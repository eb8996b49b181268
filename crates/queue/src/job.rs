//! Wire format of a queue entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::QueueError;

/// Payload stored for every queued run: `{"runId": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub run_id: Uuid,
}

impl Job {
    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!({ "runId": self.run_id })
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, QueueError> {
        serde_json::from_value(value).map_err(|e| QueueError::Malformed(e.to_string()))
    }
}
