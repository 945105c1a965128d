//! Whiteboard aggregates

pub mod chat;
pub mod hierarchy;
pub mod whiteboard_graph;

pub use chat::*;
pub use whiteboard_graph::*;
