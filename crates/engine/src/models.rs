//! Core domain models for the run engine.
//!
//! `Flow` and `Run` are the in-memory source of truth; the store
//! implementations convert them to and from `db` rows.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use nodes::{NodeDefinition, NodeOutcome};

pub use db::RunState;

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// A named, versioned, strictly linear list of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: Uuid,
    pub name: String,
    /// Starts at 1; bumped when the definition is edited.
    pub version: i32,
    /// Execution order is index order.
    pub nodes: Vec<NodeDefinition>,
    pub created_at: DateTime<Utc>,
}

impl Flow {
    /// A fresh flow at version 1.
    pub fn new(name: impl Into<String>, nodes: Vec<NodeDefinition>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            version: 1,
            nodes,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultMap
// ---------------------------------------------------------------------------

/// Node id → outcome, in the order the nodes ran.
///
/// Serialises as a JSON object whose keys follow insertion order when
/// written straight to a serializer. `serde_json::Value` sorts its keys, so
/// storage layers should not round-trip it through `Value` as an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMap(Vec<(String, NodeOutcome)>);

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` for `node_id`, replacing any earlier entry in place.
    pub fn insert(&mut self, node_id: impl Into<String>, outcome: NodeOutcome) {
        let node_id = node_id.into();
        match self.0.iter_mut().find(|(id, _)| *id == node_id) {
            Some((_, existing)) => *existing = outcome,
            None => self.0.push((node_id, outcome)),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.0.iter().find(|(id, _)| id == node_id).map(|(_, o)| o)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Node ids in execution order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeOutcome)> {
        self.0.iter().map(|(id, o)| (id.as_str(), o))
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|(_, o)| o.is_error())
    }
}

impl Serialize for ResultMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, outcome) in &self.0 {
            map.serialize_entry(id, outcome)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultMapVisitor;

        impl<'de> Visitor<'de> for ResultMapVisitor {
            type Value = ResultMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of node id to node outcome")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ResultMap, A::Error> {
                let mut out = ResultMap::new();
                while let Some((id, outcome)) = access.next_entry::<String, NodeOutcome>()? {
                    out.insert(id, outcome);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(ResultMapVisitor)
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// One triggered execution of a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub flow_id: Uuid,
    /// Flow version at trigger time. The node list itself is re-read by id
    /// when the run executes.
    pub version: i32,
    pub state: RunState,
    pub payload: Value,
    pub result: ResultMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Run {
    /// A new `queued` run of `flow` with an empty result.
    pub fn queued(flow: &Flow, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            flow_id: flow.id,
            version: flow.version,
            state: RunState::Queued,
            payload,
            result: ResultMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
