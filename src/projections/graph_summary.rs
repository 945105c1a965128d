//! Board summary projection
//!
//! Folds published events and snapshots into counters describing the board.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::GraphSnapshot;
use crate::events::{GraphEvent, RecordedEvent, WhiteboardEvent};

/// Summary information about the board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub hidden_count: usize,
    pub collapsed_count: usize,
    pub pinned_count: usize,
    /// Node count per kind
    pub kinds: BTreeMap<String, usize>,
    pub message_count: usize,
}

impl GraphSummary {
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
        for node in &snapshot.nodes {
            *kinds.entry(node.kind.to_string()).or_default() += 1;
        }
        Self {
            node_count: snapshot.nodes.len(),
            edge_count: snapshot.edges.len(),
            hidden_count: snapshot.nodes.iter().filter(|n| n.hidden).count(),
            collapsed_count: snapshot.nodes.iter().filter(|n| n.collapsed).count(),
            pinned_count: snapshot.nodes.iter().filter(|n| n.pinned).count(),
            kinds,
            message_count: snapshot.messages.len(),
        }
    }
}

/// Projection that keeps the latest summary and per-subject event counts
#[derive(Debug, Clone, Default)]
pub struct GraphSummaryProjection {
    summary: GraphSummary,
    events_by_subject: BTreeMap<String, usize>,
    nodes_added: usize,
    nodes_removed: usize,
    checkpoint: Option<u64>,
}

impl GraphSummaryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one recorded event and the snapshot published with it
    pub fn handle(&mut self, recorded: &RecordedEvent, snapshot: &GraphSnapshot) {
        if self.checkpoint.is_some_and(|seen| recorded.sequence <= seen) {
            return;
        }

        *self
            .events_by_subject
            .entry(recorded.event.subject())
            .or_default() += 1;

        match &recorded.event {
            GraphEvent::FragmentMerged(merged) => {
                self.nodes_added += merged.added_nodes.len();
                self.nodes_removed += merged.deleted_nodes.len();
            }
            GraphEvent::IdeasPlaced(placed) => self.nodes_added += placed.node_ids.len(),
            GraphEvent::LayoutApplied(applied) => self.nodes_added += applied.added_nodes.len(),
            GraphEvent::NodesRemoved(removed) => self.nodes_removed += removed.node_ids.len(),
            GraphEvent::GraphReset(reset) => self.nodes_removed += reset.removed_nodes,
            _ => {}
        }

        self.summary = GraphSummary::from_snapshot(snapshot);
        self.checkpoint = Some(recorded.sequence);
    }

    pub fn summary(&self) -> &GraphSummary {
        &self.summary
    }

    pub fn events_by_subject(&self) -> &BTreeMap<String, usize> {
        &self.events_by_subject
    }

    /// Nodes created over the projection's lifetime
    pub fn nodes_added(&self) -> usize {
        self.nodes_added
    }

    /// Nodes deleted over the projection's lifetime
    pub fn nodes_removed(&self) -> usize {
        self.nodes_removed
    }

    pub fn checkpoint(&self) -> Option<u64> {
        self.checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{WhiteboardEdge, WhiteboardNode};
    use crate::events::{FragmentMerged, GraphReset};
    use crate::value_objects::{NodeId, NodeKind};
    use chrono::Utc;

    fn snapshot() -> GraphSnapshot {
        let mut folded = WhiteboardNode::new("a", "A", NodeKind::Tech);
        folded.collapsed = true;
        let mut hidden = WhiteboardNode::new("b", "B", NodeKind::Risk);
        hidden.hidden = true;
        GraphSnapshot {
            sequence: 1,
            nodes: vec![folded, hidden],
            edges: vec![WhiteboardEdge::new("e", "a", "b")],
            messages: Vec::new(),
        }
    }

    fn recorded(sequence: u64, event: GraphEvent) -> RecordedEvent {
        RecordedEvent {
            sequence,
            recorded_at: Utc::now(),
            event,
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = GraphSummary::from_snapshot(&snapshot());

        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.edge_count, 1);
        assert_eq!(summary.hidden_count, 1);
        assert_eq!(summary.collapsed_count, 1);
        assert_eq!(summary.kinds.get("tech"), Some(&1));
    }

    #[test]
    fn test_projection_folds_events_once() {
        let mut projection = GraphSummaryProjection::new();
        let merged = recorded(
            1,
            GraphEvent::FragmentMerged(FragmentMerged {
                reset: false,
                deleted_nodes: Vec::new(),
                added_nodes: vec![NodeId::from("a"), NodeId::from("b")],
                added_edges: Vec::new(),
                dropped_edges: Vec::new(),
            }),
        );

        projection.handle(&merged, &snapshot());
        projection.handle(&merged, &snapshot());
        projection.handle(
            &recorded(
                2,
                GraphEvent::GraphReset(GraphReset {
                    removed_nodes: 2,
                    removed_edges: 1,
                }),
            ),
            &GraphSnapshot::default(),
        );

        assert_eq!(projection.nodes_added(), 2);
        assert_eq!(projection.nodes_removed(), 2);
        assert_eq!(projection.checkpoint(), Some(2));
        assert_eq!(projection.summary().node_count, 0);
        assert_eq!(projection.events_by_subject().get("whiteboard.fragment.merged.v1"), Some(&1));
    }
}
