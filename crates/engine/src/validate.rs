//! Flow validation: run this before persisting a flow definition.
//!
//! Rules enforced:
//! 1. Every node has a non-empty ID.
//! 2. Node IDs are unique within the flow (they key the run's result map).
//! 3. Every node's type is one of the built-ins.
//!
//! The executor still tolerates unknown types in definitions that reached
//! the store some other way; it skips them with a warning.

use std::collections::HashSet;

use nodes::NodeDefinition;

use crate::EngineError;

/// Check a node list before it is stored.
///
/// # Errors
/// - [`EngineError::EmptyNodeId`] if a node has an empty ID.
/// - [`EngineError::DuplicateNodeId`] if two nodes share an ID.
/// - [`EngineError::UnknownNodeType`] if a node's type is not built in.
pub fn validate_nodes(nodes: &[NodeDefinition]) -> Result<(), EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (position, node) in nodes.iter().enumerate() {
        if node.id.trim().is_empty() {
            return Err(EngineError::EmptyNodeId(position));
        }
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
        if !node.is_known() {
            return Err(EngineError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.kind.type_name().to_owned(),
            });
        }
    }

    Ok(())
}

/// Decode a raw JSON node list and validate it.
///
/// This is the entry point for definitions arriving from outside (API
/// requests, files given to `flowrun validate`).
pub fn parse_nodes(raw: serde_json::Value) -> Result<Vec<NodeDefinition>, EngineError> {
    let nodes: Vec<NodeDefinition> =
        serde_json::from_value(raw).map_err(|e| EngineError::InvalidDefinition(e.to_string()))?;
    validate_nodes(&nodes)?;
    Ok(nodes)
}
