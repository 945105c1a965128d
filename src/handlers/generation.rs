//! Generation sessions
//!
//! One round-trip with the external generator: record the request, hand the
//! generator a compact view of the board, then parse and apply its response.
//! Transport and parse failures are reported in the chat transcript and never
//! reach the caller as errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::ChatRole;
use crate::events::FragmentMerged;
use crate::fragment::{parse_fragment, DEFAULT_REPLY};
use crate::projections::GeneratorContext;
use crate::store::SharedStore;
use crate::value_objects::NodeId;

/// Reply appended when the generator could not be reached
pub const APOLOGY_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// Reply appended when the generator answered with something unusable
pub const INVALID_RESPONSE_REPLY: &str =
    "Sorry, I could not make sense of the generated update, so the whiteboard was left unchanged.";

/// Errors a generator may report
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generator transport failed: {0}")]
    Transport(String),

    #[error("Generator has no response available")]
    Exhausted,
}

/// What the generator is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GenerationRequest {
    /// Free-form prompt from the chat
    Prompt {
        text: String,
        context: GeneratorContext,
    },
    /// Generate children for an existing node
    ExpandNode {
        node_id: NodeId,
        label: String,
        context: GeneratorContext,
    },
}

impl GenerationRequest {
    pub fn context(&self) -> &GeneratorContext {
        match self {
            Self::Prompt { context, .. } | Self::ExpandNode { context, .. } => context,
        }
    }

    /// Reply used when the response carries none
    fn default_reply(&self) -> String {
        match self {
            Self::Prompt { .. } => DEFAULT_REPLY.to_string(),
            Self::ExpandNode { label, .. } => format!("Expanded \"{label}\"."),
        }
    }
}

/// Source of raw fragment text
#[async_trait]
pub trait FragmentGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError>;
}

/// How a generation round-trip ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The fragment was merged and its reply appended to the chat
    Applied { merged: FragmentMerged, reply: String },
    /// The response could not be parsed or merged; the board is unchanged
    Rejected { reason: String },
    /// The generator could not be reached or the request was invalid
    Failed { reason: String },
}

impl GenerationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Drives generator round-trips against a shared store.
///
/// The store lock is held to read the context and again to apply the
/// response, never while the generator runs. Concurrent sessions each merge
/// against whatever the board looks like when their response arrives.
pub struct WhiteboardSession {
    store: SharedStore,
    generator: Arc<dyn FragmentGenerator>,
}

impl WhiteboardSession {
    pub fn new(store: SharedStore, generator: Arc<dyn FragmentGenerator>) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Send a chat prompt to the generator and apply the response
    pub async fn submit_prompt(&self, text: impl Into<String>) -> GenerationOutcome {
        let text = text.into();
        let context = {
            let mut store = self.store.lock();
            store.append_message(ChatRole::User, text.clone());
            store.generator_context()
        };

        self.run(GenerationRequest::Prompt { text, context }).await
    }

    /// Ask the generator for children of `node_id` and apply the response
    pub async fn expand_node(&self, node_id: &NodeId) -> GenerationOutcome {
        let request = {
            let store = self.store.lock();
            let Some(node) = store.graph().node(node_id) else {
                debug!(node = %node_id, "expand requested for unknown node");
                return GenerationOutcome::Failed {
                    reason: format!("Node not found: {node_id}"),
                };
            };
            GenerationRequest::ExpandNode {
                node_id: node_id.clone(),
                label: node.label.clone(),
                context: store.generator_context(),
            }
        };

        self.run(request).await
    }

    async fn run(&self, request: GenerationRequest) -> GenerationOutcome {
        let default_reply = request.default_reply();
        let response = self.generator.generate(request).await;

        let mut store = self.store.lock();
        let text = match response {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "generator request failed");
                store.append_message(ChatRole::Ai, APOLOGY_REPLY);
                return GenerationOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        let applied = parse_fragment(&text, &default_reply).and_then(|fragment| {
            let merged = store.apply_fragment(&fragment)?;
            Ok((merged, fragment.reply))
        });

        match applied {
            Ok((merged, reply)) => {
                store.append_message(ChatRole::Ai, reply.clone());
                info!(
                    added_nodes = merged.added_nodes.len(),
                    added_edges = merged.added_edges.len(),
                    "applied generator response"
                );
                GenerationOutcome::Applied { merged, reply }
            }
            Err(err) => {
                warn!(error = %err, "discarded generator response");
                store.append_message(ChatRole::Ai, INVALID_RESPONSE_REPLY);
                GenerationOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }
}
