//! Whiteboard commands
//!
//! Commands represent intent to modify the board. UI gestures arrive as
//! batches of [`NodeChange`] / [`EdgeChange`] records; everything else is a
//! [`GraphCommand`] executed by the store.

use serde::{Deserialize, Serialize};

use crate::aggregate::{ChatRole, WhiteboardEdge, WhiteboardNode};
use crate::fragment::FragmentError;
use crate::layout::ClusterGroup;
use crate::value_objects::{EdgeId, LayoutDirection, NodeId, Position2D};

/// A single UI-originated change to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    /// The node was dragged
    Position { id: NodeId, position: Position2D },
    /// The node was selected or deselected
    Select { id: NodeId, selected: bool },
    /// The node was deleted on the canvas
    Remove { id: NodeId },
}

/// A single UI-originated change to an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    /// The edge was selected or deselected
    Select { id: EdgeId, selected: bool },
    /// The edge was deleted on the canvas
    Remove { id: EdgeId },
}

/// Commands for whiteboard operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GraphCommand {
    /// Apply a batch of node changes
    ApplyNodeChanges { changes: Vec<NodeChange> },

    /// Apply a batch of edge changes
    ApplyEdgeChanges { changes: Vec<EdgeChange> },

    /// Connect two existing nodes
    Connect { source: NodeId, target: NodeId },

    /// Delete nodes, optionally with their descendants
    DeleteNodes {
        ids: Vec<NodeId>,
        #[serde(default)]
        cascade: bool,
    },

    /// Merge nodes and edges, skipping ids already present
    MergeFragment {
        nodes: Vec<WhiteboardNode>,
        #[serde(default)]
        edges: Vec<WhiteboardEdge>,
    },

    /// Fold or unfold the subtree under a node
    ToggleFold { id: NodeId },

    /// Clear every node and edge, keeping the chat
    Reset,

    /// Recompute the hierarchical layout
    Relayout { direction: Option<LayoutDirection> },

    /// Arrange every node on a square grid
    GridLayout,

    /// Arrange nodes into titled clusters
    ClusterLayout {
        groups: Vec<ClusterGroup>,
        #[serde(default)]
        with_titles: bool,
    },

    /// Place new idea notes around an anchor node or the board center
    ScatterIdeas {
        anchor: Option<NodeId>,
        labels: Vec<String>,
    },

    /// Append a chat message
    AppendMessage { role: ChatRole, content: String },
}

/// Result type for whiteboard commands
pub type GraphCommandResult<T> = Result<T, GraphCommandError>;

/// Errors that can occur during command processing
#[derive(Debug, thiserror::Error)]
pub enum GraphCommandError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Fragment(#[from] FragmentError),
}
