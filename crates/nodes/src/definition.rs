//! Node definitions as stored in a flow.
//!
//! On the wire a node is a flat JSON object tagged by `type`:
//!
//! ```json
//! { "id": "n1", "type": "http_request", "method": "POST", "url": "https://…" }
//! { "id": "n2", "type": "delay", "ms": 250 }
//! { "id": "n3", "type": "log", "message": "hello" }
//! ```
//!
//! Decoding goes through [`RawNode`] so that field errors on known types are
//! reported with the node id, while unrecognised types still decode (as
//! [`NodeKind::Unknown`]) and keep their fields for round-tripping.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DefinitionError, DelayNode, ExecutableNode, HttpRequestNode, LogNode};
use crate::delay::DEFAULT_DELAY_MS;

pub const HTTP_REQUEST: &str = "http_request";
pub const DELAY: &str = "delay";
pub const LOG: &str = "log";

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct NodeDefinition {
    /// Unique within its flow; key into the run's result map.
    pub id: String,
    pub kind: NodeKind,
}

/// The closed set of node types, plus a catch-all for anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    HttpRequest(HttpRequestNode),
    Delay(DelayNode),
    Log(LogNode),
    /// A `type` this engine does not implement. Kept so stored flows still
    /// load; the executor skips it.
    Unknown {
        node_type: String,
        fields: Map<String, Value>,
    },
}

impl NodeKind {
    /// The `type` tag this kind is stored under.
    pub fn type_name(&self) -> &str {
        match self {
            Self::HttpRequest(_) => HTTP_REQUEST,
            Self::Delay(_) => DELAY,
            Self::Log(_) => LOG,
            Self::Unknown { node_type, .. } => node_type,
        }
    }

    /// The runnable implementation, or `None` for unknown types.
    pub fn as_executable(&self) -> Option<&dyn ExecutableNode> {
        match self {
            Self::HttpRequest(node) => Some(node as &dyn ExecutableNode),
            Self::Delay(node) => Some(node as &dyn ExecutableNode),
            Self::Log(node) => Some(node as &dyn ExecutableNode),
            Self::Unknown { .. } => None,
        }
    }
}

impl NodeDefinition {
    pub fn http_request(id: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::HttpRequest(HttpRequestNode::new(method, url)),
        }
    }

    pub fn delay(id: impl Into<String>, ms: u64) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Delay(DelayNode { ms }),
        }
    }

    pub fn log(id: impl Into<String>, message: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Log(LogNode {
                message: message.map(str::to_owned),
            }),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self.kind, NodeKind::Unknown { .. })
    }
}

/// Flat wire shape of a node definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TryFrom<RawNode> for NodeDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let RawNode { id, node_type, mut fields } = raw;

        let kind = match node_type.as_str() {
            HTTP_REQUEST => {
                let url = match fields.remove("url") {
                    Some(Value::String(url)) if !url.is_empty() => url,
                    Some(Value::String(_)) | Some(Value::Null) | None => {
                        return Err(DefinitionError::MissingField { node_id: id, field: "url" });
                    }
                    Some(other) => {
                        return Err(invalid(id, "url", format!("expected string, got {other}")));
                    }
                };
                let method = match fields.remove("method") {
                    None | Some(Value::Null) => Method::GET,
                    Some(Value::String(m)) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                        .map_err(|e| invalid(id.clone(), "method", e.to_string()))?,
                    Some(other) => {
                        return Err(invalid(id, "method", format!("expected string, got {other}")));
                    }
                };
                NodeKind::HttpRequest(HttpRequestNode { method, url })
            }
            DELAY => {
                let ms = match fields.remove("ms") {
                    None | Some(Value::Null) => DEFAULT_DELAY_MS,
                    Some(v) => v.as_u64().ok_or_else(|| {
                        invalid(id.clone(), "ms", format!("expected non-negative integer, got {v}"))
                    })?,
                };
                NodeKind::Delay(DelayNode { ms })
            }
            LOG => {
                let message = match fields.remove("message") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(m)) => Some(m),
                    Some(other) => {
                        return Err(invalid(id, "message", format!("expected string, got {other}")));
                    }
                };
                NodeKind::Log(LogNode { message })
            }
            _ => NodeKind::Unknown { node_type, fields },
        };

        Ok(Self { id, kind })
    }
}

impl From<NodeDefinition> for RawNode {
    fn from(node: NodeDefinition) -> Self {
        let node_type = node.kind.type_name().to_owned();
        let mut fields = Map::new();
        match node.kind {
            NodeKind::HttpRequest(http) => {
                fields.insert("method".into(), Value::String(http.method.as_str().to_owned()));
                fields.insert("url".into(), Value::String(http.url));
            }
            NodeKind::Delay(delay) => {
                fields.insert("ms".into(), Value::from(delay.ms));
            }
            NodeKind::Log(log) => {
                if let Some(message) = log.message {
                    fields.insert("message".into(), Value::String(message));
                }
            }
            NodeKind::Unknown { fields: extra, .. } => fields = extra,
        }
        Self { id: node.id, node_type, fields }
    }
}

fn invalid(node_id: String, field: &'static str, reason: String) -> DefinitionError {
    DefinitionError::InvalidField { node_id, field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<NodeDefinition, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn http_request_defaults_to_get() {
        let node = decode(json!({ "id": "n1", "type": "http_request", "url": "http://a" })).unwrap();
        assert_eq!(node, NodeDefinition::http_request("n1", Method::GET, "http://a"));
    }

    #[test]
    fn http_method_is_case_insensitive() {
        let node = decode(json!({ "id": "n1", "type": "http_request", "method": "post", "url": "http://a" }))
            .unwrap();
        assert_eq!(node, NodeDefinition::http_request("n1", Method::POST, "http://a"));
    }

    #[test]
    fn http_request_without_url_is_rejected() {
        let err = decode(json!({ "id": "n1", "type": "http_request" })).unwrap_err();
        assert!(err.to_string().contains("missing required field 'url'"), "{err}");
    }

    #[test]
    fn delay_defaults_to_one_second() {
        let node = decode(json!({ "id": "d", "type": "delay" })).unwrap();
        assert_eq!(node.kind, NodeKind::Delay(DelayNode { ms: 1000 }));
    }

    #[test]
    fn explicit_zero_delay_is_kept() {
        let node = decode(json!({ "id": "d", "type": "delay", "ms": 0 })).unwrap();
        assert_eq!(node.kind, NodeKind::Delay(DelayNode { ms: 0 }));
    }

    #[test]
    fn negative_delay_is_rejected() {
        let err = decode(json!({ "id": "d", "type": "delay", "ms": -5 })).unwrap_err();
        assert!(err.to_string().contains("invalid 'ms'"), "{err}");
    }

    #[test]
    fn log_message_is_optional() {
        let node = decode(json!({ "id": "l", "type": "log" })).unwrap();
        assert_eq!(node, NodeDefinition::log("l", None));
    }

    #[test]
    fn unknown_type_decodes_and_keeps_its_fields() {
        let wire = json!({ "id": "x", "type": "email", "to": "ops@example.com" });
        let node = decode(wire.clone()).unwrap();
        assert!(!node.is_known());
        assert_eq!(node.kind.type_name(), "email");
        assert!(node.kind.as_executable().is_none());
        assert_eq!(serde_json::to_value(&node).unwrap(), wire);
    }

    #[test]
    fn known_types_serialise_back_to_flat_objects() {
        let nodes = vec![
            NodeDefinition::http_request("n1", Method::PUT, "http://a"),
            NodeDefinition::delay("n2", 10),
            NodeDefinition::log("n3", Some("hi")),
        ];
        assert_eq!(
            serde_json::to_value(&nodes).unwrap(),
            json!([
                { "id": "n1", "type": "http_request", "method": "PUT", "url": "http://a" },
                { "id": "n2", "type": "delay", "ms": 10 },
                { "id": "n3", "type": "log", "message": "hi" },
            ])
        );
    }
}
