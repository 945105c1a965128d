//! Read-side projections of the whiteboard

pub mod generator_context;
pub mod graph_summary;
pub mod snapshot;

pub use generator_context::*;
pub use graph_summary::*;
pub use snapshot::*;
