//! Whiteboard command and generation handlers
//!
//! Handlers are the async edge of the crate. They lock the shared store only
//! for the duration of a synchronous mutation.

mod generation;
mod replay;

pub use generation::*;
pub use replay::ReplayGenerator;

use async_trait::async_trait;

use crate::commands::{GraphCommand, GraphCommandResult};
use crate::events::RecordedEvent;
use crate::store::SharedStore;

/// Trait for handling whiteboard commands
#[async_trait]
pub trait GraphCommandHandler: Send + Sync {
    /// Execute a command, returning the event it published, if any
    async fn handle_graph_command(
        &self,
        command: GraphCommand,
    ) -> GraphCommandResult<Option<RecordedEvent>>;
}

/// Command handler backed by a shared [`GraphStore`](crate::store::GraphStore)
#[derive(Clone)]
pub struct StoreCommandHandler {
    store: SharedStore,
}

impl StoreCommandHandler {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

#[async_trait]
impl GraphCommandHandler for StoreCommandHandler {
    async fn handle_graph_command(
        &self,
        command: GraphCommand,
    ) -> GraphCommandResult<Option<RecordedEvent>> {
        self.store.lock().execute(command)
    }
}
