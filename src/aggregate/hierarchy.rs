//! Hierarchy operations over the whiteboard graph
//!
//! Cascading delete and subtree fold/unfold. Both follow outgoing edges only
//! (parent → child) and track visited ids, so cyclic graphs terminate. All
//! functions are pure: they take a graph and return a new one.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tracing::debug;

use super::whiteboard_graph::WhiteboardGraph;
use crate::value_objects::NodeId;

/// Outgoing adjacency in edge order
fn outgoing(graph: &WhiteboardGraph) -> HashMap<&NodeId, Vec<&NodeId>> {
    let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in graph.edges() {
        adjacency.entry(&edge.source).or_default().push(&edge.target);
    }
    adjacency
}

/// Collect everything reachable from `seeds` along outgoing edges.
///
/// When `include_seeds` is true the seeds themselves are part of the result,
/// otherwise a seed only appears if it is reachable from another node.
fn reachable<'a>(
    adjacency: &HashMap<&'a NodeId, Vec<&'a NodeId>>,
    seeds: &[&'a NodeId],
    include_seeds: bool,
) -> IndexSet<NodeId> {
    let mut visited: IndexSet<NodeId> = IndexSet::new();
    let mut stack: Vec<&'a NodeId> = Vec::new();

    for seed in seeds.iter().rev() {
        if include_seeds {
            stack.push(*seed);
        } else if let Some(children) = adjacency.get(*seed) {
            stack.extend(children.iter().rev().copied());
        }
    }

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if let Some(children) = adjacency.get(current) {
            // Reverse so children are visited in edge order
            for child in children.iter().rev() {
                if !visited.contains(*child) {
                    stack.push(*child);
                }
            }
        }
    }

    visited
}

/// The cascading closure of `seeds`: the seeds plus every node reachable from
/// them. Seeds absent from the graph are still reported but reach nothing.
pub fn cascade_closure(graph: &WhiteboardGraph, seeds: &[NodeId]) -> IndexSet<NodeId> {
    let adjacency = outgoing(graph);
    let seeds: Vec<&NodeId> = seeds.iter().collect();
    reachable(&adjacency, &seeds, true)
}

/// All descendants of `node_id`, excluding the node itself unless it lies on a cycle.
pub fn descendants(graph: &WhiteboardGraph, node_id: &NodeId) -> IndexSet<NodeId> {
    let adjacency = outgoing(graph);
    reachable(&adjacency, &[node_id], false)
}

/// Remove the cascading closure of `seeds` and every edge touching it.
pub fn cascade_delete(graph: &WhiteboardGraph, seeds: &[NodeId]) -> WhiteboardGraph {
    let closure = cascade_closure(graph, seeds);
    let survivors = WhiteboardGraph::from_parts(
        graph
            .nodes()
            .filter(|node| !closure.contains(&node.id))
            .cloned(),
        graph
            .edges()
            .filter(|edge| !closure.contains(&edge.source) && !closure.contains(&edge.target))
            .cloned(),
    );
    debug!(
        seeds = seeds.len(),
        removed = graph.node_count() - survivors.node_count(),
        "cascade delete"
    );
    survivors
}

/// Remove exactly `ids` and the edges touching them, without following children.
pub fn direct_delete(graph: &WhiteboardGraph, ids: &[NodeId]) -> WhiteboardGraph {
    let doomed: HashSet<&NodeId> = ids.iter().collect();
    WhiteboardGraph::from_parts(
        graph.nodes().filter(|node| !doomed.contains(&node.id)).cloned(),
        graph
            .edges()
            .filter(|edge| !doomed.contains(&edge.source) && !doomed.contains(&edge.target))
            .cloned(),
    )
}

/// Recompute every node's `hidden` flag from the `collapsed` flags.
///
/// A node is hidden iff it can be reached in one or more hops from a collapsed node.
pub fn recompute_visibility(graph: &WhiteboardGraph) -> WhiteboardGraph {
    let adjacency = outgoing(graph);
    let collapsed: Vec<&NodeId> = graph
        .nodes()
        .filter(|node| node.collapsed)
        .map(|node| &node.id)
        .collect();
    let hidden = reachable(&adjacency, &collapsed, false);

    let mut next = graph.clone();
    let ids: Vec<NodeId> = graph.nodes().map(|node| node.id.clone()).collect();
    for id in ids {
        if let Some(node) = next.node_mut(&id) {
            node.hidden = hidden.contains(&id);
        }
    }
    next
}

/// Fold or unfold the subtree under `node_id`.
///
/// The fold state lives on the parent, so sibling subtrees fold independently.
/// Folding a leaf or an unknown node is a no-op and returns the graph unchanged.
pub fn toggle_fold(graph: &WhiteboardGraph, node_id: &NodeId) -> WhiteboardGraph {
    if !graph.contains_node(node_id) || !graph.has_children(node_id) {
        return graph.clone();
    }

    let mut next = graph.clone();
    if let Some(node) = next.node_mut(node_id) {
        node.collapsed = !node.collapsed;
        debug!(node = %node_id, collapsed = node.collapsed, "toggled fold");
    }
    recompute_visibility(&next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{WhiteboardEdge, WhiteboardNode};
    use crate::value_objects::NodeKind;

    fn graph_of(nodes: &[&str], edges: &[(&str, &str)]) -> WhiteboardGraph {
        WhiteboardGraph::from_parts(
            nodes
                .iter()
                .map(|id| WhiteboardNode::new(*id, id.to_uppercase(), NodeKind::Default)),
            edges
                .iter()
                .map(|(s, t)| WhiteboardEdge::new(format!("{s}-{t}"), *s, *t)),
        )
    }

    fn ids(graph: &WhiteboardGraph) -> Vec<&str> {
        graph.nodes().map(|n| n.id.as_str()).collect()
    }

    fn hidden(graph: &WhiteboardGraph) -> Vec<&str> {
        graph
            .nodes()
            .filter(|n| n.hidden)
            .map(|n| n.id.as_str())
            .collect()
    }

    fn tree() -> WhiteboardGraph {
        graph_of(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("a", "d")])
    }

    #[test]
    fn test_cascade_from_root_removes_everything() {
        let result = cascade_delete(&tree(), &[NodeId::from("a")]);

        assert!(ids(&result).is_empty());
        assert_eq!(result.edge_count(), 0);
    }

    #[test]
    fn test_cascade_from_middle_keeps_siblings() {
        let result = cascade_delete(&tree(), &[NodeId::from("b")]);

        assert_eq!(ids(&result), vec!["a", "d"]);
        let edges: Vec<&str> = result.edges().map(|e| e.id.as_str()).collect();
        assert_eq!(edges, vec!["a-d"]);
    }

    #[test]
    fn test_cascade_terminates_on_cycles() {
        let graph = graph_of(&["a", "b", "c", "z"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let result = cascade_delete(&graph, &[NodeId::from("b")]);

        assert_eq!(ids(&result), vec!["z"]);
    }

    #[test]
    fn test_cascade_ignores_absent_ids() {
        let result = cascade_delete(&tree(), &[NodeId::from("ghost"), NodeId::from("c")]);

        assert_eq!(ids(&result), vec!["a", "b", "d"]);
        assert_eq!(result.edge_count(), 2);
    }

    #[test]
    fn test_direct_delete_keeps_children() {
        let result = direct_delete(&tree(), &[NodeId::from("a")]);

        assert_eq!(ids(&result), vec!["b", "c", "d"]);
        let edges: Vec<&str> = result.edges().map(|e| e.id.as_str()).collect();
        assert_eq!(edges, vec!["b-c"]);
    }

    #[test]
    fn test_closure_order_follows_edges() {
        let closure = cascade_closure(&tree(), &[NodeId::from("a")]);
        let order: Vec<&str> = closure.iter().map(|id| id.as_str()).collect();

        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_fold_hides_whole_subtree() {
        let folded = toggle_fold(&tree(), &NodeId::from("a"));

        assert_eq!(hidden(&folded), vec!["b", "c", "d"]);
        assert!(folded.node(&NodeId::from("a")).is_some_and(|n| n.collapsed && !n.hidden));
    }

    #[test]
    fn test_fold_is_self_inverse() {
        let start = toggle_fold(&tree(), &NodeId::from("b"));
        let twice = toggle_fold(&toggle_fold(&start, &NodeId::from("a")), &NodeId::from("a"));

        assert_eq!(hidden(&start), hidden(&twice));
        assert_eq!(start, twice);
    }

    #[test]
    fn test_unfold_keeps_collapsed_descendants_folded() {
        let graph = toggle_fold(&tree(), &NodeId::from("b"));
        let graph = toggle_fold(&graph, &NodeId::from("a"));
        let graph = toggle_fold(&graph, &NodeId::from("a"));

        assert_eq!(hidden(&graph), vec!["c"]);
    }

    #[test]
    fn test_siblings_fold_independently() {
        let graph = graph_of(
            &["root", "left", "l1", "right", "r1"],
            &[("root", "left"), ("left", "l1"), ("root", "right"), ("right", "r1")],
        );
        let graph = toggle_fold(&graph, &NodeId::from("left"));

        assert_eq!(hidden(&graph), vec!["l1"]);
    }

    #[test]
    fn test_fold_leaf_is_noop() {
        let graph = tree();

        assert_eq!(toggle_fold(&graph, &NodeId::from("c")), graph);
        assert_eq!(toggle_fold(&graph, &NodeId::from("ghost")), graph);
    }

    #[test]
    fn test_fold_on_cycle_terminates() {
        let graph = graph_of(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let folded = toggle_fold(&graph, &NodeId::from("a"));

        assert_eq!(hidden(&folded), vec!["a", "b"]);
    }
}
