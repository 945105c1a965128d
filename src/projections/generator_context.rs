//! Compact board description sent to the generator

use serde::{Deserialize, Serialize};

use crate::aggregate::WhiteboardGraph;
use crate::value_objects::{NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNode {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// What the generator knows about the current board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorContext {
    pub nodes: Vec<ContextNode>,
    pub edges: Vec<ContextEdge>,
}

impl GeneratorContext {
    /// Project every node and edge of `graph`, hidden ones included
    pub fn from_graph(graph: &WhiteboardGraph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|node| ContextNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    kind: node.kind,
                })
                .collect(),
            edges: graph
                .edges()
                .map(|edge| ContextEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    label: edge.label.clone(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Context rendered as JSON for inclusion in a prompt
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
