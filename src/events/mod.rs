//! Whiteboard events
//!
//! Every published store mutation is described by one [`GraphEvent`] and
//! recorded with a sequence number in the store's bounded event log.

mod graph_events;

pub use graph_events::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enum wrapper for whiteboard events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// Nodes were moved or (de)selected
    NodesChanged(NodesChanged),
    /// Nodes were deleted
    NodesRemoved(NodesRemoved),
    /// Edges were (de)selected
    EdgesChanged(EdgesChanged),
    /// Edges were deleted
    EdgesRemoved(EdgesRemoved),
    /// Two nodes were connected by hand
    EdgeConnected(EdgeConnected),
    /// A generator fragment was applied
    FragmentMerged(FragmentMerged),
    /// A subtree was folded or unfolded
    FoldToggled(FoldToggled),
    /// The board was cleared
    GraphReset(GraphReset),
    /// An explicit layout was applied
    LayoutApplied(LayoutApplied),
    /// Idea notes were scattered on the board
    IdeasPlaced(IdeasPlaced),
    /// A chat message was appended
    MessageAppended(MessageAppended),
}

impl GraphEvent {
    fn inner(&self) -> &dyn WhiteboardEvent {
        match self {
            Self::NodesChanged(e) => e,
            Self::NodesRemoved(e) => e,
            Self::EdgesChanged(e) => e,
            Self::EdgesRemoved(e) => e,
            Self::EdgeConnected(e) => e,
            Self::FragmentMerged(e) => e,
            Self::FoldToggled(e) => e,
            Self::GraphReset(e) => e,
            Self::LayoutApplied(e) => e,
            Self::IdeasPlaced(e) => e,
            Self::MessageAppended(e) => e,
        }
    }
}

impl WhiteboardEvent for GraphEvent {
    fn event_type(&self) -> &'static str {
        self.inner().event_type()
    }

    fn subject(&self) -> String {
        self.inner().subject()
    }
}

/// An event as stored in the mutation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Monotonic per-store sequence number, starting at 1
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: GraphEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{LayoutDirection, NodeId};

    #[test]
    fn test_subjects_are_versioned() {
        let removed = GraphEvent::NodesRemoved(NodesRemoved {
            node_ids: vec![NodeId::from("a")],
            cascade: true,
            removed_edges: 1,
        });
        let layout = GraphEvent::LayoutApplied(LayoutApplied {
            layout: LayoutKind::Hierarchical(LayoutDirection::TopToBottom),
            positioned: 3,
            added_nodes: Vec::new(),
        });

        assert_eq!(removed.event_type(), "NodesRemoved");
        assert_eq!(removed.subject(), "whiteboard.nodes.cascade_removed.v1");
        assert_eq!(layout.subject(), "whiteboard.layout.hierarchical.v1");
    }

    #[test]
    fn test_event_serialization() {
        let event = GraphEvent::FoldToggled(FoldToggled {
            node_id: NodeId::from("root"),
            collapsed: false,
            hidden_nodes: 0,
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: GraphEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.subject(), "whiteboard.node.unfolded.v1");
    }
}
