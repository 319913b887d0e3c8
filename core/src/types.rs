//! Domain DTOs for the knowledge-graph API.
//!
//! # Design
//! These mirror the backend's JSON but are defined independently of the
//! mock-server crate. Integration tests catch schema drift between the two.
//! Edge endpoints are named `from`/`to` on the wire because the frontend
//! feeds them straight into a network-graph renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node in a graph payload. `id` and `label` are both the entity name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

/// A directed, weighted relation between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub relation: String,
}

/// Nodes and edges returned by every graph-data endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Request payload for the question-answering endpoint.
///
/// Fields other than `question` and `mode` are kept in `extra` and forwarded
/// untouched, so a caller-built object reaches the server unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QaRequest {
    pub question: String,
    /// Answer mode; the backend defaults to `"quick"` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QaRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

impl From<&str> for QaRequest {
    fn from(question: &str) -> Self {
        Self::new(question)
    }
}

impl From<String> for QaRequest {
    fn from(question: String) -> Self {
        Self::new(question)
    }
}

/// A follow-up entity suggested alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub entity: String,
    pub reason: String,
    pub weight: i64,
}

/// Result of the question-answering endpoint. `answer` is HTML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaAnswer {
    pub answer: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}
