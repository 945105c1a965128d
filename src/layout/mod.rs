//! Layout algorithms
//!
//! Hierarchical layered layout for structure diagrams and spatial placement
//! (spiral, grid, cluster) for free-form boards. Layouts borrow the graph and
//! return positions; the store decides where to write them.

pub mod hierarchical;
pub mod placement;

pub use hierarchical::{layered_layout, LayeredLayout};
pub use placement::{
    cluster_layout, grid_layout, non_overlapping_position, spiral_position, ClusterGroup,
    ClusterLayout, ClusterPlan, GridLayout, SpiralSearch,
};
