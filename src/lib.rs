//! Graph state engine for an AI-assisted whiteboard
//!
//! A live, user-edited graph of nodes and edges that grows incrementally from
//! fragments produced by an external generator. The engine merges untrusted
//! fragments without duplicates, keeps the hierarchy consistent under cascade
//! deletion and folding, and lays the result out deterministically.

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod events;
pub mod fragment;
pub mod handlers;
pub mod layout;
pub mod projections;
pub mod store;
pub mod value_objects;

// Re-export main types
pub use aggregate::{ChatMessage, ChatRole, ChatTranscript, WhiteboardEdge, WhiteboardGraph, WhiteboardNode};
pub use config::{ConfigError, DanglingEdgePolicy, WhiteboardConfig, WorkspaceMode};
pub use events::{GraphEvent, RecordedEvent, WhiteboardEvent};
pub use store::{GraphStore, SharedStore, SubscriptionId};

// Re-export commands and their types
pub use commands::{EdgeChange, GraphCommand, GraphCommandError, GraphCommandResult, NodeChange};

// Re-export the generator boundary
pub use fragment::{parse_fragment, FragmentError, ValidatedFragment};
pub use handlers::{
    FragmentGenerator, GenerationOutcome, GenerationRequest, GeneratorError, GraphCommandHandler,
    ReplayGenerator, StoreCommandHandler, WhiteboardSession,
};

// Re-export projections
pub use projections::{GeneratorContext, GraphSnapshot, GraphSummary, GraphSummaryProjection};

// Re-export value objects
pub use value_objects::{EdgeId, EdgeStyle, LayoutDirection, NodeId, NodeKind, Position2D, Size};
