//! Generator fragments
//!
//! Everything between raw generator text and a graph mutation: JSON
//! extraction, schema validation and merge planning.

pub mod extract;
pub mod merge;
pub mod schema;

pub use extract::extract_json;
pub use merge::{plan_merge, MergePlan};
pub use schema::{parse_fragment, ValidatedFragment, DEFAULT_REPLY};

use crate::value_objects::{EdgeId, NodeId};

/// Errors that reject a whole fragment
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    #[error("Generator response is empty")]
    Empty,

    #[error("Invalid JSON received from generator: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response has no nodes array")]
    MissingNodes,

    #[error("Node {index} has no id")]
    MissingNodeId { index: usize },

    #[error("Edge {index} is missing its source or target")]
    MissingEdgeEndpoint { index: usize },

    #[error("Edge {edge} references unknown node {node}")]
    DanglingEdge { edge: EdgeId, node: NodeId },
}

pub type FragmentResult<T> = Result<T, FragmentError>;
