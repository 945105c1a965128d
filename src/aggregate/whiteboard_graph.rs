//! Whiteboard Graph Aggregate
//!
//! The live node/edge graph the store owns. Nodes and edges are kept in
//! insertion order, which is also the order the rendering surface receives.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value_objects::{EdgeId, EdgeStyle, NodeId, NodeKind, Position2D};

/// A node on the whiteboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardNode {
    /// Unique, stable identifier
    pub id: NodeId,
    /// Text shown on the node
    pub label: String,
    /// Visual category
    #[serde(default)]
    pub kind: NodeKind,
    /// Canvas position
    #[serde(default)]
    pub position: Position2D,
    /// Hidden because an ancestor is folded
    #[serde(default)]
    pub hidden: bool,
    /// Selected on the canvas
    #[serde(default)]
    pub selected: bool,
    /// This node's subtree is folded away
    #[serde(default)]
    pub collapsed: bool,
    /// Excluded from automatic layout
    #[serde(default)]
    pub pinned: bool,
}

impl WhiteboardNode {
    /// Create a new visible, unselected node at the origin
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            position: Position2D::default(),
            hidden: false,
            selected: false,
            collapsed: false,
            pinned: false,
        }
    }

    /// Builder-style position override
    pub fn at(mut self, position: Position2D) -> Self {
        self.position = position;
        self
    }

    /// Whether the hierarchical layout may move this node
    pub fn is_auto_laid_out(&self) -> bool {
        self.kind.is_hierarchical() && !self.pinned
    }
}

/// A directed edge between two whiteboard nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardEdge {
    /// Unique identifier
    pub id: EdgeId,
    /// Parent end of the edge
    pub source: NodeId,
    /// Child end of the edge
    pub target: NodeId,
    /// Optional relationship label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Rendering style
    #[serde(default, rename = "type")]
    pub style: EdgeStyle,
    /// Rendered with a moving dash
    #[serde(default)]
    pub animated: bool,
    /// Selected on the canvas
    #[serde(default)]
    pub selected: bool,
}

impl WhiteboardEdge {
    /// Create an animated smoothstep edge
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
            style: EdgeStyle::SmoothStep,
            animated: true,
            selected: false,
        }
    }

    /// Builder-style label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Ordered node and edge sets with unique ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardGraph {
    nodes: IndexMap<NodeId, WhiteboardNode>,
    edges: IndexMap<EdgeId, WhiteboardEdge>,
}

impl WhiteboardGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from node and edge lists; later duplicates are dropped
    pub fn from_parts(
        nodes: impl IntoIterator<Item = WhiteboardNode>,
        edges: impl IntoIterator<Item = WhiteboardEdge>,
    ) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node);
        }
        for edge in edges {
            graph.insert_edge(edge);
        }
        graph
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &WhiteboardNode> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &WhiteboardEdge> {
        self.edges.values()
    }

    pub fn node(&self, id: &NodeId) -> Option<&WhiteboardNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut WhiteboardNode> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&WhiteboardEdge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut WhiteboardEdge> {
        self.edges.get_mut(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Insert a node unless its id is already taken. Returns whether it was added.
    pub fn insert_node(&mut self, node: WhiteboardNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Insert an edge unless its id is already taken or an endpoint is missing.
    /// Returns whether it was added.
    pub fn insert_edge(&mut self, edge: WhiteboardEdge) -> bool {
        if self.edges.contains_key(&edge.id)
            || !self.nodes.contains_key(&edge.source)
            || !self.nodes.contains_key(&edge.target)
        {
            return false;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<WhiteboardEdge> {
        self.edges.shift_remove(id)
    }

    /// Drop every node and edge
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Whether `id` has at least one outgoing edge
    pub fn has_children(&self, id: &NodeId) -> bool {
        self.edges.values().any(|edge| &edge.source == id)
    }

    /// Overwrite positions for the given nodes; unknown ids are ignored
    pub fn set_positions<'a>(
        &mut self,
        positions: impl IntoIterator<Item = (&'a NodeId, &'a Position2D)>,
    ) {
        for (id, position) in positions {
            if let Some(node) = self.nodes.get_mut(id) {
                node.position = *position;
            }
        }
    }

    /// Find nodes referenced by edges but not defined
    pub fn find_missing_endpoints(&self) -> Vec<NodeId> {
        let mut missing: Vec<NodeId> = self
            .edges
            .values()
            .flat_map(|edge| [&edge.source, &edge.target])
            .filter(|id| !self.nodes.contains_key(*id))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WhiteboardGraph {
        WhiteboardGraph::from_parts(
            [
                WhiteboardNode::new("a", "A", NodeKind::Default),
                WhiteboardNode::new("b", "B", NodeKind::Tech),
                WhiteboardNode::new("c", "C", NodeKind::Risk),
            ],
            [
                WhiteboardEdge::new("a-b", "a", "b"),
                WhiteboardEdge::new("b-c", "b", "c").with_label("limits"),
            ],
        )
    }

    #[test]
    fn test_graph_creation() {
        let graph = sample();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_node(&NodeId::from("b")));
        assert!(graph.find_missing_endpoints().is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut graph = sample();

        assert!(!graph.insert_node(WhiteboardNode::new("a", "Other", NodeKind::Role)));
        assert_eq!(graph.node(&NodeId::from("a")).map(|n| n.label.as_str()), Some("A"));
        assert!(!graph.insert_edge(WhiteboardEdge::new("a-b", "b", "c")));
    }

    #[test]
    fn test_edge_needs_both_endpoints() {
        let mut graph = sample();

        assert!(!graph.insert_edge(WhiteboardEdge::new("x", "a", "ghost")));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut graph = sample();
        graph.insert_node(WhiteboardNode::new("0", "Zero", NodeKind::Default));

        let order: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "0"]);
        assert!(graph.has_children(&NodeId::from("a")));
        assert!(!graph.has_children(&NodeId::from("c")));
    }

    #[test]
    fn test_edge_serializes_type_field() {
        let edge = WhiteboardEdge::new("e", "a", "b");
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["type"], "smoothstep");
        assert_eq!(json["animated"], true);
        assert!(json.get("label").is_none());
    }
}
