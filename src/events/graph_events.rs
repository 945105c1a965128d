//! Whiteboard graph events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::ChatRole;
use crate::value_objects::{EdgeId, LayoutDirection, NodeId};

/// Common behaviour of every whiteboard event
pub trait WhiteboardEvent {
    /// Short, stable name of the event
    fn event_type(&self) -> &'static str;

    /// Versioned routing subject
    fn subject(&self) -> String;
}

/// Nodes were dragged or (de)selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesChanged {
    /// Nodes whose position changed
    pub moved: Vec<NodeId>,
    /// Nodes whose selection changed
    pub selected: Vec<NodeId>,
    /// Nodes pinned by this change
    pub pinned: Vec<NodeId>,
}

/// Nodes were deleted, with or without their descendants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesRemoved {
    /// Every node actually removed
    pub node_ids: Vec<NodeId>,
    /// Whether descendants were removed too
    pub cascade: bool,
    /// Number of edges removed along with the nodes
    pub removed_edges: usize,
}

/// Edges were (de)selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgesChanged {
    pub edge_ids: Vec<EdgeId>,
}

/// Edges were deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgesRemoved {
    pub edge_ids: Vec<EdgeId>,
}

/// The user connected two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConnected {
    pub edge_id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// A generator fragment was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentMerged {
    /// The board was cleared first
    pub reset: bool,
    /// Nodes removed (cascading) before the merge
    pub deleted_nodes: Vec<NodeId>,
    pub added_nodes: Vec<NodeId>,
    pub added_edges: Vec<EdgeId>,
    /// Edges dropped for an unknown endpoint
    pub dropped_edges: Vec<EdgeId>,
}

/// A subtree was folded or unfolded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldToggled {
    pub node_id: NodeId,
    pub collapsed: bool,
    /// Hidden nodes on the board after the toggle
    pub hidden_nodes: usize,
}

/// All nodes and edges were cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphReset {
    pub removed_nodes: usize,
    pub removed_edges: usize,
}

/// Which placement produced a [`LayoutApplied`] event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Hierarchical(LayoutDirection),
    Grid,
    Cluster,
}

/// Positions were recomputed by an explicit layout request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutApplied {
    pub layout: LayoutKind,
    /// Number of nodes that received a position
    pub positioned: usize,
    /// Nodes created by the layout, such as cluster titles
    pub added_nodes: Vec<NodeId>,
}

/// Idea notes were scattered on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeasPlaced {
    /// Node the ideas were placed around, if any
    pub anchor: Option<NodeId>,
    pub node_ids: Vec<NodeId>,
}

/// A chat message was appended to the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAppended {
    pub message_id: Uuid,
    pub role: ChatRole,
}

impl WhiteboardEvent for NodesChanged {
    fn event_type(&self) -> &'static str {
        "NodesChanged"
    }

    fn subject(&self) -> String {
        "whiteboard.nodes.changed.v1".to_string()
    }
}

impl WhiteboardEvent for NodesRemoved {
    fn event_type(&self) -> &'static str {
        "NodesRemoved"
    }

    fn subject(&self) -> String {
        if self.cascade {
            "whiteboard.nodes.cascade_removed.v1".to_string()
        } else {
            "whiteboard.nodes.removed.v1".to_string()
        }
    }
}

impl WhiteboardEvent for EdgesChanged {
    fn event_type(&self) -> &'static str {
        "EdgesChanged"
    }

    fn subject(&self) -> String {
        "whiteboard.edges.changed.v1".to_string()
    }
}

impl WhiteboardEvent for EdgesRemoved {
    fn event_type(&self) -> &'static str {
        "EdgesRemoved"
    }

    fn subject(&self) -> String {
        "whiteboard.edges.removed.v1".to_string()
    }
}

impl WhiteboardEvent for EdgeConnected {
    fn event_type(&self) -> &'static str {
        "EdgeConnected"
    }

    fn subject(&self) -> String {
        "whiteboard.edge.connected.v1".to_string()
    }
}

impl WhiteboardEvent for FragmentMerged {
    fn event_type(&self) -> &'static str {
        "FragmentMerged"
    }

    fn subject(&self) -> String {
        "whiteboard.fragment.merged.v1".to_string()
    }
}

impl WhiteboardEvent for FoldToggled {
    fn event_type(&self) -> &'static str {
        "FoldToggled"
    }

    fn subject(&self) -> String {
        if self.collapsed {
            "whiteboard.node.folded.v1".to_string()
        } else {
            "whiteboard.node.unfolded.v1".to_string()
        }
    }
}

impl WhiteboardEvent for GraphReset {
    fn event_type(&self) -> &'static str {
        "GraphReset"
    }

    fn subject(&self) -> String {
        "whiteboard.graph.reset.v1".to_string()
    }
}

impl WhiteboardEvent for LayoutApplied {
    fn event_type(&self) -> &'static str {
        "LayoutApplied"
    }

    fn subject(&self) -> String {
        let layout = match self.layout {
            LayoutKind::Hierarchical(_) => "hierarchical",
            LayoutKind::Grid => "grid",
            LayoutKind::Cluster => "cluster",
        };
        format!("whiteboard.layout.{layout}.v1")
    }
}

impl WhiteboardEvent for IdeasPlaced {
    fn event_type(&self) -> &'static str {
        "IdeasPlaced"
    }

    fn subject(&self) -> String {
        "whiteboard.ideas.placed.v1".to_string()
    }
}

impl WhiteboardEvent for MessageAppended {
    fn event_type(&self) -> &'static str {
        "MessageAppended"
    }

    fn subject(&self) -> String {
        "whiteboard.chat.appended.v1".to_string()
    }
}
