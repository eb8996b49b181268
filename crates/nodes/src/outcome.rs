//! Per-node outcome record stored in a run's result map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// What happened when one node ran.
///
/// Serialises to the compact shapes stored on the run:
/// `{"status":"ok"}`, `{"status":"ok","data":…}`, `{"status":"ok","slept":10}`
/// or `{"status":"error","error":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slept: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeOutcome {
    pub fn ok() -> Self {
        Self {
            status: OutcomeStatus::Ok,
            data: None,
            slept: None,
            error: None,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn slept(ms: u64) -> Self {
        Self {
            slept: Some(ms),
            ..Self::ok()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            data: None,
            slept: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_outcomes_serialise_without_empty_fields() {
        assert_eq!(serde_json::to_value(NodeOutcome::ok()).unwrap(), json!({ "status": "ok" }));
        assert_eq!(
            serde_json::to_value(NodeOutcome::slept(10)).unwrap(),
            json!({ "status": "ok", "slept": 10 })
        );
        assert_eq!(
            serde_json::to_value(NodeOutcome::with_data(json!({ "a": 1 }))).unwrap(),
            json!({ "status": "ok", "data": { "a": 1 } })
        );
    }

    #[test]
    fn error_outcome_carries_message() {
        let outcome = NodeOutcome::error("boom");
        assert!(outcome.is_error());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "status": "error", "error": "boom" })
        );
    }
}
