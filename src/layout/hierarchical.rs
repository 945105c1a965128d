//! Layered hierarchical layout
//!
//! A Sugiyama-style layout over the auto-laid-out nodes of a whiteboard:
//!
//! 1. back edges found by an iterative DFS are ignored, so cycles terminate
//! 2. rank = longest path from the roots of the remaining DAG
//! 3. nodes within a rank are ordered by barycenter sweeps, keeping the
//!    ordering with the fewest crossings
//! 4. ranks map to the primary axis, order to the secondary axis; every rank is
//!    centred in its component and components are packed side by side
//!
//! The result only depends on the node and edge order of the input graph.

use std::collections::HashSet;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use tracing::{debug, warn};

use crate::aggregate::WhiteboardGraph;
use crate::config::LayoutConfig;
use crate::value_objects::{LayoutDirection, NodeId, Position2D};

/// Layered layout parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredLayout {
    /// Distance between ranks on the primary axis
    pub rank_spacing: f64,
    /// Distance between neighbours within a rank
    pub node_spacing: f64,
    /// Extra space between disconnected components
    pub component_gap: f64,
    /// Maximum number of barycenter sweeps
    pub crossing_passes: usize,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for LayeredLayout {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            rank_spacing: config.rank_spacing,
            node_spacing: config.node_spacing,
            component_gap: config.component_gap,
            crossing_passes: config.crossing_passes,
        }
    }
}

/// An edge between two consecutive ranks, as (upper, lower)
type Link = (NodeIndex, NodeIndex);

impl LayeredLayout {
    /// Compute a position for every node the layout is allowed to move.
    ///
    /// Sticky and pinned nodes are not part of the result and edges touching
    /// them are ignored.
    pub fn compute(&self, graph: &WhiteboardGraph, direction: LayoutDirection) -> IndexMap<NodeId, Position2D> {
        let dag = participant_graph(graph);
        if dag.node_count() == 0 {
            return IndexMap::new();
        }

        let back = back_edges(&dag);
        let acyclic = dag.filter_map(
            |_, id| Some(id.clone()),
            |edge, _| (!back.contains(&edge)).then_some(()),
        );
        let ranks = longest_path_ranks(&acyclic);

        let mut positions: Vec<Option<Position2D>> = vec![None; acyclic.node_count()];
        let mut secondary_offset = 0.0;

        for component in components(&acyclic) {
            let mut layers = layers_of(&component, &ranks);
            let links = links_by_rank(&acyclic, &component, &ranks, layers.len());
            self.minimize_crossings(&mut layers, &links, acyclic.node_count());

            let widest = layers
                .iter()
                .map(|layer| self.extent(layer.len()))
                .fold(0.0, f64::max);

            for (rank, layer) in layers.iter().enumerate() {
                let start = secondary_offset + (widest - self.extent(layer.len())) / 2.0;
                for (order, node) in layer.iter().enumerate() {
                    let primary = rank as f64 * self.rank_spacing;
                    let secondary = start + order as f64 * self.node_spacing;
                    positions[node.index()] = Some(match direction {
                        LayoutDirection::LeftToRight => Position2D::new(primary, secondary),
                        LayoutDirection::TopToBottom => Position2D::new(secondary, primary),
                    });
                }
            }

            secondary_offset += widest + self.node_spacing + self.component_gap;
        }

        debug!(
            nodes = acyclic.node_count(),
            back_edges = back.len(),
            ?direction,
            "computed layered layout"
        );

        acyclic
            .node_indices()
            .filter_map(|index| positions[index.index()].map(|position| (acyclic[index].clone(), position)))
            .collect()
    }

    /// Secondary-axis length covered by `count` neighbours
    fn extent(&self, count: usize) -> f64 {
        count.saturating_sub(1) as f64 * self.node_spacing
    }

    /// Alternate downward and upward barycenter sweeps, keeping the best ordering
    fn minimize_crossings(&self, layers: &mut Vec<Vec<NodeIndex>>, links: &[Vec<Link>], node_count: usize) {
        if layers.len() < 2 {
            return;
        }

        let mut order = vec![0usize; node_count];
        refresh_order(layers, &mut order);

        let mut best = layers.clone();
        let mut best_crossings = total_crossings(links, &order);

        for pass in 0..self.crossing_passes {
            if best_crossings == 0 {
                break;
            }
            if pass % 2 == 0 {
                for rank in 1..layers.len() {
                    sort_by_barycenter(&mut layers[rank], &links[rank - 1], &order, |&(upper, lower)| (lower, upper));
                    refresh_order(&layers[rank..=rank], &mut order);
                }
            } else {
                for rank in (0..layers.len() - 1).rev() {
                    sort_by_barycenter(&mut layers[rank], &links[rank], &order, |&link| link);
                    refresh_order(&layers[rank..=rank], &mut order);
                }
            }

            let crossings = total_crossings(links, &order);
            if crossings < best_crossings {
                best_crossings = crossings;
                best = layers.clone();
            }
        }

        *layers = best;
    }
}

/// Petgraph view of the auto-laid-out nodes, in graph order, without self
/// loops or parallel edges.
fn participant_graph(graph: &WhiteboardGraph) -> DiGraph<NodeId, ()> {
    let mut dag = DiGraph::new();
    let mut indices: IndexMap<&NodeId, NodeIndex> = IndexMap::new();

    for node in graph.nodes().filter(|node| node.is_auto_laid_out()) {
        indices.insert(&node.id, dag.add_node(node.id.clone()));
    }
    for edge in graph.edges() {
        if let (Some(&source), Some(&target)) = (indices.get(&edge.source), indices.get(&edge.target)) {
            if source != target && dag.find_edge(source, target).is_none() {
                dag.add_edge(source, target, ());
            }
        }
    }
    dag
}

/// Outgoing edges of `node` in insertion order, reversed for popping
fn pending_edges(dag: &DiGraph<NodeId, ()>, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut edges: Vec<(EdgeIndex, NodeIndex)> = dag
        .edges_directed(node, Outgoing)
        .map(|edge| (edge.id(), edge.target()))
        .collect();
    edges.sort_by_key(|(edge, _)| std::cmp::Reverse(edge.index()));
    edges
}

/// Edges closing a cycle, found by an iterative DFS that starts at the roots
fn back_edges(dag: &DiGraph<NodeId, ()>) -> HashSet<EdgeIndex> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        Open,
        Closed,
    }

    let mut marks = vec![Mark::Unseen; dag.node_count()];
    let mut back = HashSet::new();

    let roots = dag
        .node_indices()
        .filter(|&node| dag.neighbors_directed(node, Incoming).next().is_none());
    let starts: Vec<NodeIndex> = roots.chain(dag.node_indices()).collect();

    for start in starts {
        if marks[start.index()] != Mark::Unseen {
            continue;
        }
        marks[start.index()] = Mark::Open;
        let mut stack = vec![(start, pending_edges(dag, start))];

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            match pending.pop() {
                Some((edge, target)) => match marks[target.index()] {
                    Mark::Unseen => {
                        marks[target.index()] = Mark::Open;
                        stack.push((target, pending_edges(dag, target)));
                    }
                    Mark::Open => {
                        back.insert(edge);
                    }
                    Mark::Closed => {}
                },
                None => {
                    marks[node.index()] = Mark::Closed;
                    stack.pop();
                }
            }
        }
    }

    back
}

/// Longest-path rank of every node; roots are rank 0
fn longest_path_ranks(acyclic: &DiGraph<NodeId, ()>) -> Vec<usize> {
    let order = match petgraph::algo::toposort(acyclic, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!(node = %acyclic[cycle.node_id()], "cycle left after back edge removal");
            acyclic.node_indices().collect()
        }
    };

    let mut ranks = vec![0usize; acyclic.node_count()];
    for node in order {
        let next = ranks[node.index()] + 1;
        for child in acyclic.neighbors_directed(node, Outgoing) {
            if ranks[child.index()] < next {
                ranks[child.index()] = next;
            }
        }
    }
    ranks
}

/// Weakly connected components, ordered by their first node
fn components(acyclic: &DiGraph<NodeId, ()>) -> Vec<Vec<NodeIndex>> {
    let mut sets = UnionFind::new(acyclic.node_count());
    for edge in acyclic.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut grouped: IndexMap<usize, Vec<NodeIndex>> = IndexMap::new();
    for node in acyclic.node_indices() {
        grouped.entry(sets.find(node.index())).or_default().push(node);
    }
    grouped.into_values().collect()
}

/// Bucket a component's nodes by rank, keeping graph order within a rank
fn layers_of(component: &[NodeIndex], ranks: &[usize]) -> Vec<Vec<NodeIndex>> {
    let depth = component
        .iter()
        .map(|node| ranks[node.index()])
        .max()
        .unwrap_or(0);
    let mut layers = vec![Vec::new(); depth + 1];
    for &node in component {
        layers[ranks[node.index()]].push(node);
    }
    layers
}

/// Edges of `component` joining rank `r` to rank `r + 1`, bucketed by `r`
fn links_by_rank(
    acyclic: &DiGraph<NodeId, ()>,
    component: &[NodeIndex],
    ranks: &[usize],
    depth: usize,
) -> Vec<Vec<Link>> {
    let mut links = vec![Vec::new(); depth.saturating_sub(1)];
    for &source in component {
        let upper = ranks[source.index()];
        if upper >= links.len() {
            continue;
        }
        for target in acyclic.neighbors_directed(source, Outgoing) {
            if ranks[target.index()] == upper + 1 {
                links[upper].push((source, target));
            }
        }
    }
    for between in &mut links {
        between.sort_by_key(|(source, target)| (source.index(), target.index()));
    }
    links
}

fn refresh_order(layers: &[Vec<NodeIndex>], order: &mut [usize]) {
    for layer in layers {
        for (position, node) in layer.iter().enumerate() {
            order[node.index()] = position;
        }
    }
}

/// Sort `layer` by the mean order of each node's neighbours in the fixed rank.
///
/// `orient` maps a link to (node in `layer`, neighbour in the fixed rank).
/// Nodes without neighbours keep their current slot as their weight.
fn sort_by_barycenter(
    layer: &mut [NodeIndex],
    links: &[Link],
    order: &[usize],
    orient: impl Fn(&Link) -> Link,
) {
    let weight = |node: NodeIndex| -> f64 {
        let (sum, count) = links
            .iter()
            .map(&orient)
            .filter(|(own, _)| *own == node)
            .fold((0usize, 0usize), |(sum, count), (_, other)| (sum + order[other.index()], count + 1));
        if count == 0 {
            order[node.index()] as f64
        } else {
            sum as f64 / count as f64
        }
    };

    let mut weighted: Vec<(f64, NodeIndex)> = layer.iter().map(|&node| (weight(node), node)).collect();
    weighted.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (slot, (_, node)) in layer.iter_mut().zip(weighted) {
        *slot = node;
    }
}

/// Number of pairwise crossings between consecutive ranks
fn total_crossings(links: &[Vec<Link>], order: &[usize]) -> usize {
    links.iter().map(|between| count_crossings(between, order)).sum()
}

fn count_crossings(links: &[Link], order: &[usize]) -> usize {
    let mut crossings = 0;
    for (i, &(u1, v1)) in links.iter().enumerate() {
        for &(u2, v2) in &links[i + 1..] {
            let (a, b) = (order[u1.index()], order[u2.index()]);
            let (c, d) = (order[v1.index()], order[v2.index()]);
            if (a < b && c > d) || (a > b && c < d) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Layered layout with the default spacing
pub fn layered_layout(graph: &WhiteboardGraph, direction: LayoutDirection) -> IndexMap<NodeId, Position2D> {
    LayeredLayout::default().compute(graph, direction)
}
