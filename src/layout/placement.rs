//! Spatial placement
//!
//! Stateless placement functions for free-form boards: golden-angle spiral,
//! collision-avoiding spiral search, square grids and grouped clusters.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::{WhiteboardGraph, WhiteboardNode};
use crate::config::PlacementConfig;
use crate::value_objects::{NodeId, NodeKind, Position2D, Size};

/// Angular step between consecutive spiral slots
pub const GOLDEN_ANGLE_DEGREES: f64 = 137.5;

/// Position of the `index`-th item on a golden-angle spiral around `center`.
pub fn spiral_position(index: usize, center: Position2D, scale: f64) -> Position2D {
    let angle = (index as f64 * GOLDEN_ANGLE_DEGREES).to_radians();
    let radius = scale * ((index + 1) as f64).sqrt();
    center.offset(radius * angle.cos(), radius * angle.sin())
}

/// Spiral search for a free spot among existing nodes
#[derive(Debug, Clone, PartialEq)]
pub struct SpiralSearch {
    /// Added to the larger node dimension to get the separation distance
    pub separation_margin: f64,
    /// Candidates tried before giving up
    pub max_iterations: usize,
    /// Side of the square the random fallback lands in
    pub fallback_spread: f64,
}

impl Default for SpiralSearch {
    fn default() -> Self {
        Self {
            separation_margin: 50.0,
            max_iterations: 100,
            fallback_spread: 1000.0,
        }
    }
}

impl From<&PlacementConfig> for SpiralSearch {
    fn from(config: &PlacementConfig) -> Self {
        Self {
            separation_margin: config.separation_margin,
            max_iterations: config.max_iterations,
            fallback_spread: config.fallback_spread,
        }
    }
}

impl SpiralSearch {
    /// Minimum center distance kept between a new node and every existing one
    pub fn separation(&self, size: Size) -> f64 {
        size.max_side() + self.separation_margin
    }

    /// First spiral candidate far enough from every existing position.
    ///
    /// The first candidate is `center` itself. When every candidate collides,
    /// a random point within half the fallback spread of `center` is returned,
    /// or `center` itself when the spread is not positive.
    pub fn find<R: Rng + ?Sized>(
        &self,
        existing: &[Position2D],
        center: Position2D,
        size: Size,
        rng: &mut R,
    ) -> Position2D {
        if existing.is_empty() {
            return center;
        }

        let separation = self.separation(size);
        let mut angle: f64 = 0.0;
        let mut radius: f64 = 0.0;

        for i in 0..self.max_iterations {
            let candidate = center.offset(radius * angle.cos(), radius * angle.sin());
            if existing
                .iter()
                .all(|position| position.distance_to(&candidate) >= separation)
            {
                return candidate;
            }
            angle += 1.0;
            radius = ((i + 1) as f64).sqrt() * separation;
        }

        let half = self.fallback_spread / 2.0;
        if !half.is_finite() || half <= 0.0 {
            return center;
        }
        center.offset(rng.gen_range(-half..=half), rng.gen_range(-half..=half))
    }
}

/// Collision-avoiding spiral search with the default tunables
pub fn non_overlapping_position<R: Rng + ?Sized>(
    existing: &[Position2D],
    center: Position2D,
    size: Size,
    rng: &mut R,
) -> Position2D {
    SpiralSearch::default().find(existing, center, size, rng)
}

/// Square grid placement
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub cell_size: f64,
    pub gap: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: 280.0,
            gap: 40.0,
        }
    }
}

impl From<&PlacementConfig> for GridLayout {
    fn from(config: &PlacementConfig) -> Self {
        Self {
            cell_size: config.grid_cell,
            gap: config.grid_gap,
        }
    }
}

impl GridLayout {
    /// Lay `ids` out row by row in `ceil(sqrt(n))` columns
    pub fn compute<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> IndexMap<NodeId, Position2D> {
        let ids: Vec<&NodeId> = ids.into_iter().collect();
        let columns = square_columns(ids.len());
        let stride = self.cell_size + self.gap;

        ids.into_iter()
            .enumerate()
            .map(|(index, id)| {
                let (col, row) = (index % columns, index / columns);
                (id.clone(), Position2D::new(col as f64 * stride, row as f64 * stride))
            })
            .collect()
    }
}

/// Grid placement with the default cell and gap
pub fn grid_layout<'a>(ids: impl IntoIterator<Item = &'a NodeId>) -> IndexMap<NodeId, Position2D> {
    GridLayout::default().compute(ids)
}

/// A titled group of nodes for [`ClusterLayout`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGroup {
    pub title: String,
    pub node_ids: Vec<NodeId>,
}

impl ClusterGroup {
    pub fn new(title: impl Into<String>, node_ids: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        Self {
            title: title.into(),
            node_ids: node_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a cluster layout: new positions plus optional title nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterPlan {
    /// Positions of grouped nodes; nodes not mentioned keep theirs
    pub positions: IndexMap<NodeId, Position2D>,
    /// Pinned title nodes, one per group whose first member exists
    pub titles: Vec<WhiteboardNode>,
}

/// Groups laid out side by side, each as its own small grid
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayout {
    /// Distance between members of one group
    pub node_spacing: f64,
    /// Space between neighbouring groups
    pub group_padding: f64,
    /// Distance of a title above its group's first member
    pub title_offset: f64,
}

impl Default for ClusterLayout {
    fn default() -> Self {
        Self {
            node_spacing: 220.0,
            group_padding: 300.0,
            title_offset: 80.0,
        }
    }
}

impl From<&PlacementConfig> for ClusterLayout {
    fn from(config: &PlacementConfig) -> Self {
        Self {
            node_spacing: config.cluster_spacing,
            group_padding: config.cluster_padding,
            title_offset: config.title_offset,
        }
    }
}

impl ClusterLayout {
    /// Compute cluster positions for `groups` over the nodes of `graph`.
    ///
    /// Ids missing from the graph keep their slot in the group grid but produce
    /// no position. If a node appears in several groups the last one wins.
    pub fn compute(&self, graph: &WhiteboardGraph, groups: &[ClusterGroup], with_titles: bool) -> ClusterPlan {
        let mut plan = ClusterPlan::default();
        let mut current_x = 0.0;

        for (group_index, group) in groups.iter().enumerate() {
            let columns = square_columns(group.node_ids.len());

            for (index, node_id) in group.node_ids.iter().enumerate() {
                if !graph.contains_node(node_id) {
                    continue;
                }
                let (col, row) = (index % columns, index / columns);
                plan.positions.insert(
                    node_id.clone(),
                    Position2D::new(
                        current_x + col as f64 * self.node_spacing,
                        row as f64 * self.node_spacing,
                    ),
                );
            }

            if with_titles {
                let anchor = group
                    .node_ids
                    .first()
                    .and_then(|first| plan.positions.get(first));
                if let Some(anchor) = anchor {
                    let mut title = WhiteboardNode::new(
                        NodeId::generate(&format!("group-title-{group_index}")),
                        group.title.clone(),
                        NodeKind::Default,
                    )
                    .at(anchor.offset(0.0, -self.title_offset));
                    title.pinned = true;
                    plan.titles.push(title);
                }
            }

            current_x += columns as f64 * self.node_spacing + self.group_padding;
        }

        plan
    }
}

/// Cluster placement with the default spacing
pub fn cluster_layout(graph: &WhiteboardGraph, groups: &[ClusterGroup], with_titles: bool) -> ClusterPlan {
    ClusterLayout::default().compute(graph, groups, with_titles)
}

/// Column count of the smallest square grid holding `count` items
fn square_columns(count: usize) -> usize {
    ((count as f64).sqrt().ceil() as usize).max(1)
}
