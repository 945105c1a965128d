//! Whiteboard store integration tests

use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use whiteboard_graph::{
    aggregate::hierarchy,
    layout::{cluster_layout, layered_layout, ClusterGroup, SpiralSearch},
    EdgeChange, GraphCommand, GraphStore, LayoutDirection, NodeChange, NodeId, NodeKind,
    Position2D, Size, WhiteboardConfig, WhiteboardEdge, WhiteboardGraph, WhiteboardNode,
    WorkspaceMode,
};

fn node(id: &str) -> WhiteboardNode {
    WhiteboardNode::new(id, id.to_uppercase(), NodeKind::Default)
}

fn edge(id: &str, source: &str, target: &str) -> WhiteboardEdge {
    WhiteboardEdge::new(id, source, target)
}

/// A graph over `n0..n{count}` with one edge per pair, self-loops skipped.
/// With `acyclic` every edge points from the lower to the higher index.
fn indexed_graph(count: usize, pairs: &[(usize, usize)], acyclic: bool) -> WhiteboardGraph {
    let nodes = (0..count).map(|i| node(&format!("n{i}")));
    let edges = pairs
        .iter()
        .filter(|(a, b)| a != b && *a < count && *b < count)
        .enumerate()
        .map(|(k, &(a, b))| {
            let (source, target) = if acyclic { (a.min(b), a.max(b)) } else { (a, b) };
            edge(&format!("e{k}"), &format!("n{source}"), &format!("n{target}"))
        });
    WhiteboardGraph::from_parts(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_session() {
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 42);

        store.merge_fragment(vec![node("a")], Vec::new()).unwrap();
        assert_eq!(store.snapshot().nodes.len(), 1);

        store
            .merge_fragment(vec![node("a"), node("b")], vec![edge("e1", "a", "b")])
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);

        assert!(store.toggle_fold(&NodeId::from("a")));
        let b = store.snapshot().node(&NodeId::from("b")).cloned().unwrap();
        assert!(b.hidden);
        assert_eq!(store.snapshot().visible_edges().count(), 0);

        store.remove_nodes(&[NodeId::from("a")]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id.as_str(), "b");
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_fragment_without_new_ids_is_a_noop() {
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 1);
        let fragment = (
            vec![node("a"), node("b"), node("c")],
            vec![edge("e1", "a", "b"), edge("e2", "a", "c")],
        );
        store.merge_fragment(fragment.0.clone(), fragment.1.clone()).unwrap();
        let first = store.snapshot();

        let merged = store.merge_fragment(fragment.0, fragment.1).unwrap();

        assert!(merged.added_nodes.is_empty() && merged.added_edges.is_empty());
        assert_eq!(store.snapshot(), first);
    }

    #[test]
    fn test_canvas_delete_cascades_over_structure() {
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 1);
        store
            .merge_fragment(
                vec![node("root"), node("api"), node("db"), node("ui")],
                vec![
                    edge("e1", "root", "api"),
                    edge("e2", "api", "db"),
                    edge("e3", "root", "ui"),
                ],
            )
            .unwrap();

        store
            .execute(GraphCommand::ApplyNodeChanges {
                changes: vec![NodeChange::Remove { id: NodeId::from("api") }],
            })
            .unwrap();

        let ids: Vec<&str> = store.graph().nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "ui"]);
        assert!(store.graph().find_missing_endpoints().is_empty());

        store
            .execute(GraphCommand::ApplyEdgeChanges {
                changes: vec![EdgeChange::Remove { id: "e3".into() }],
            })
            .unwrap();
        assert_eq!(store.graph().node_count(), 2);
        assert_eq!(store.graph().edge_count(), 0);
    }

    #[test]
    fn test_commands_from_json() {
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 1);
        let commands: Vec<GraphCommand> = serde_json::from_str(
            r#"[
                { "command": "mergeFragment",
                  "nodes": [{ "id": "a", "label": "A" }, { "id": "b", "label": "B", "kind": "tech" }],
                  "edges": [{ "id": "e1", "source": "a", "target": "b" }] },
                { "command": "relayout", "direction": "TB" },
                { "command": "appendMessage", "role": "user", "content": "looks good" }
            ]"#,
        )
        .unwrap();

        for command in commands {
            assert!(store.execute(command).unwrap().is_some());
        }

        let b = store.graph().node(&NodeId::from("b")).cloned().unwrap();
        assert_eq!(b.kind, NodeKind::Tech);
        assert_eq!(b.position, Position2D::new(0.0, 250.0));
        assert_eq!(store.transcript().len(), 2);
    }

    #[test]
    fn test_brainstorm_board_keeps_spiral_positions() {
        let config = WhiteboardConfig::default().with_workspace(WorkspaceMode::Brainstorm);
        let mut store = GraphStore::with_seed(config, 3);

        store
            .merge_fragment(vec![node("a"), node("b")], vec![edge("e1", "a", "b")])
            .unwrap();
        let before: Vec<Position2D> = store.graph().nodes().map(|n| n.position).collect();
        store.relayout(None);
        let after: Vec<Position2D> = store.graph().nodes().map(|n| n.position).collect();

        assert_eq!(before, after);
        assert!(store.graph().nodes().all(|n| n.kind == NodeKind::Sticky));
    }

    #[test]
    fn test_twenty_spiral_placements_never_overlap() {
        let search = SpiralSearch::default();
        let size = Size::default();
        let separation = search.separation(size);
        let mut rng = StdRng::seed_from_u64(0);
        let mut placed: Vec<Position2D> = Vec::new();

        for _ in 0..20 {
            let position = search.find(&placed, Position2D::default(), size, &mut rng);
            placed.push(position);
        }

        for (i, first) in placed.iter().enumerate() {
            for second in &placed[i + 1..] {
                assert!(first.distance_to(second) >= separation - 1e-9);
            }
        }
    }

    #[test]
    fn test_cluster_layout_covers_every_listed_node() {
        let graph = WhiteboardGraph::from_parts(
            ["a", "b", "c", "d", "e"].map(node),
            Vec::<WhiteboardEdge>::new(),
        );
        let groups = [
            ClusterGroup::new("Left", ["a", "b", "c"]),
            ClusterGroup::new("Right", ["d", "e", "missing"]),
        ];

        let plan = cluster_layout(&graph, &groups, true);

        assert_eq!(plan.positions.len(), 5);
        assert_eq!(plan.titles.len(), 2);
        assert!(plan.titles.iter().all(|title| title.pinned));
        let unique: HashSet<(u64, u64)> = plan
            .positions
            .values()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect();
        assert_eq!(unique.len(), 5);
    }
}

proptest! {
    #[test]
    fn prop_layout_is_deterministic_and_ranked(
        count in 1..12usize,
        pairs in proptest::collection::vec((0..12usize, 0..12usize), 0..24)
    ) {
        let graph = indexed_graph(count, &pairs, true);

        let first = layered_layout(&graph, LayoutDirection::LeftToRight);
        let second = layered_layout(&graph, LayoutDirection::LeftToRight);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), count);

        for e in graph.edges() {
            prop_assert!(first[&e.target].x > first[&e.source].x);
        }

        let unique: HashSet<(u64, u64)> = first.values().map(|p| (p.x.to_bits(), p.y.to_bits())).collect();
        prop_assert_eq!(unique.len(), count);
    }

    #[test]
    fn prop_layout_tolerates_cycles(
        count in 1..10usize,
        pairs in proptest::collection::vec((0..10usize, 0..10usize), 0..30)
    ) {
        let graph = indexed_graph(count, &pairs, false);

        let top_down = layered_layout(&graph, LayoutDirection::TopToBottom);
        prop_assert_eq!(top_down.len(), count);
        prop_assert!(top_down.values().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn prop_cascade_delete_leaves_no_descendant_or_dangling_edge(
        count in 1..10usize,
        pairs in proptest::collection::vec((0..10usize, 0..10usize), 0..30),
        seed in 0..10usize
    ) {
        let graph = indexed_graph(count, &pairs, false);
        let seed = NodeId::from(format!("n{}", seed % count));
        let doomed = hierarchy::descendants(&graph, &seed);
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 0);
        store.merge_fragment(graph.nodes().cloned().collect(), graph.edges().cloned().collect()).unwrap();

        store.delete_nodes(std::slice::from_ref(&seed), true);

        prop_assert!(!store.graph().contains_node(&seed));
        prop_assert!(store.graph().nodes().all(|n| !doomed.contains(&n.id)));
        prop_assert!(store.graph().find_missing_endpoints().is_empty());
    }

    #[test]
    fn prop_fold_twice_restores_board(
        count in 2..10usize,
        pairs in proptest::collection::vec((0..10usize, 0..10usize), 1..20)
    ) {
        let graph = indexed_graph(count, &pairs, true);
        let mut store = GraphStore::with_seed(WhiteboardConfig::default(), 0);
        store.merge_fragment(graph.nodes().cloned().collect(), graph.edges().cloned().collect()).unwrap();
        let before = store.graph().clone();

        let parent = before.nodes().find(|n| before.has_children(&n.id)).map(|n| n.id.clone());
        if let Some(parent) = parent {
            prop_assert!(store.toggle_fold(&parent));
            prop_assert!(store.toggle_fold(&parent));
            prop_assert_eq!(store.graph(), &before);
        }
    }
}
