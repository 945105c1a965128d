//! Fragment merge planning
//!
//! Id-based deduplication of an incoming fragment against the live graph.
//! Planning is pure; the store applies a plan in one step or not at all.

use std::collections::HashSet;

use tracing::warn;

use super::{FragmentError, FragmentResult};
use crate::aggregate::{WhiteboardEdge, WhiteboardGraph, WhiteboardNode};
use crate::config::DanglingEdgePolicy;
use crate::value_objects::{EdgeId, NodeId};

/// The part of a fragment that is new to the graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    /// Nodes whose ids are not yet present, in fragment order
    pub nodes: Vec<WhiteboardNode>,
    /// Edges whose ids are not yet present and whose endpoints resolve
    pub edges: Vec<WhiteboardEdge>,
    /// Edges dropped because an endpoint exists nowhere
    pub dropped_edges: Vec<EdgeId>,
}

impl MergePlan {
    /// Whether applying the plan would change nothing
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn added_node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }

    pub fn added_edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|edge| edge.id.clone()).collect()
    }

    /// Append the planned nodes, then the planned edges
    pub fn apply_to(self, graph: &mut WhiteboardGraph) {
        for node in self.nodes {
            graph.insert_node(node);
        }
        for edge in self.edges {
            graph.insert_edge(edge);
        }
    }
}

/// Plan the merge of `nodes` and `edges` into `existing`.
///
/// Only ids absent from the graph (and not seen earlier in the fragment) are
/// kept. An edge endpoint may be any existing node or any node of the
/// fragment, including ones that are deduplicated away. Edges with an endpoint
/// found in neither are dropped or reject the fragment, per `policy`.
pub fn plan_merge(
    existing: &WhiteboardGraph,
    nodes: &[WhiteboardNode],
    edges: &[WhiteboardEdge],
    policy: DanglingEdgePolicy,
) -> FragmentResult<MergePlan> {
    if let Some(index) = nodes.iter().position(|node| node.id.as_str().is_empty()) {
        return Err(FragmentError::MissingNodeId { index });
    }

    let incoming: HashSet<&NodeId> = nodes.iter().map(|node| &node.id).collect();
    let resolves = |id: &NodeId| existing.contains_node(id) || incoming.contains(id);

    let mut plan = MergePlan::default();
    let mut planned_nodes: HashSet<&NodeId> = HashSet::new();
    for node in nodes {
        if !existing.contains_node(&node.id) && planned_nodes.insert(&node.id) {
            plan.nodes.push(node.clone());
        }
    }

    let mut planned_edges: HashSet<&EdgeId> = HashSet::new();
    for edge in edges {
        if existing.contains_edge(&edge.id) || planned_edges.contains(&edge.id) {
            continue;
        }
        let missing: Vec<&NodeId> = [&edge.source, &edge.target]
            .into_iter()
            .filter(|id| !resolves(id))
            .collect();
        if let Some(&missing) = missing.first() {
            match policy {
                DanglingEdgePolicy::RejectFragment => {
                    return Err(FragmentError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: missing.clone(),
                    });
                }
                DanglingEdgePolicy::DropEdge => {
                    warn!(edge = %edge.id, node = %missing, "dropping edge with unknown endpoint");
                    plan.dropped_edges.push(edge.id.clone());
                    continue;
                }
            }
        }
        planned_edges.insert(&edge.id);
        plan.edges.push(edge.clone());
    }

    Ok(plan)
}
