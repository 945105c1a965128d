//! Immutable board snapshot
//!
//! The full ordered node and edge lists plus the chat transcript, re-emitted
//! after every mutation. Consumers receive it behind an `Arc` and never see a
//! half-applied change.

use serde::{Deserialize, Serialize};

use crate::aggregate::{ChatMessage, ChatTranscript, WhiteboardEdge, WhiteboardGraph, WhiteboardNode};
use crate::value_objects::NodeId;

/// Point-in-time view of the whiteboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Sequence number of the last event folded into this snapshot
    pub sequence: u64,
    pub nodes: Vec<WhiteboardNode>,
    pub edges: Vec<WhiteboardEdge>,
    pub messages: Vec<ChatMessage>,
}

impl GraphSnapshot {
    pub fn capture(graph: &WhiteboardGraph, transcript: &ChatTranscript, sequence: u64) -> Self {
        Self {
            sequence,
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
            messages: transcript.messages().to_vec(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&WhiteboardNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Nodes the rendering surface should draw
    pub fn visible_nodes(&self) -> impl Iterator<Item = &WhiteboardNode> {
        self.nodes.iter().filter(|node| !node.hidden)
    }

    /// Edges whose endpoints are both visible
    pub fn visible_edges(&self) -> impl Iterator<Item = &WhiteboardEdge> {
        self.edges.iter().filter(move |edge| {
            [&edge.source, &edge.target]
                .into_iter()
                .all(|id| self.node(id).is_some_and(|node| !node.hidden))
        })
    }

    /// Rebuild a graph value from the snapshot
    pub fn to_graph(&self) -> WhiteboardGraph {
        WhiteboardGraph::from_parts(self.nodes.iter().cloned(), self.edges.iter().cloned())
    }
}
