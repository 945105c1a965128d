//! Graph store
//!
//! The single source of truth for one whiteboard. Every mutation runs to
//! completion synchronously: the live graph is replaced, visibility and (for
//! set-changing operations) the hierarchical layout are recomputed, a
//! [`GraphEvent`] is recorded and subscribers receive the new snapshot.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::hierarchy;
use crate::aggregate::{ChatRole, ChatTranscript, WhiteboardEdge, WhiteboardGraph, WhiteboardNode};
use crate::commands::{EdgeChange, GraphCommand, GraphCommandError, GraphCommandResult, NodeChange};
use crate::config::{LayoutConfig, WhiteboardConfig, WorkspaceMode};
use crate::events::{
    EdgeConnected, EdgesChanged, EdgesRemoved, FoldToggled, FragmentMerged, GraphEvent, GraphReset,
    IdeasPlaced, LayoutApplied, LayoutKind, MessageAppended, NodesChanged, NodesRemoved,
    RecordedEvent, WhiteboardEvent,
};
use crate::fragment::{plan_merge, FragmentResult, ValidatedFragment};
use crate::layout::{spiral_position, ClusterGroup, ClusterLayout, GridLayout, LayeredLayout, SpiralSearch};
use crate::projections::{GeneratorContext, GraphSnapshot};
use crate::value_objects::{EdgeId, LayoutDirection, NodeId, NodeKind, Position2D};

/// A store shared between the composition root and async sessions
pub type SharedStore = Arc<Mutex<GraphStore>>;

/// Callback invoked after every published mutation.
///
/// Listeners run while the store is borrowed and must not call back into it.
pub type Listener = Box<dyn Fn(&RecordedEvent, &GraphSnapshot) + Send + Sync>;

/// Handle returned by [`GraphStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub struct GraphStore {
    config: WhiteboardConfig,
    graph: WhiteboardGraph,
    transcript: ChatTranscript,
    snapshot: Arc<GraphSnapshot>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    log: VecDeque<RecordedEvent>,
    last_published: Option<RecordedEvent>,
    sequence: u64,
    rng: StdRng,
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("messages", &self.transcript.len())
            .field("listeners", &self.listeners.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(WhiteboardConfig::default())
    }
}

impl GraphStore {
    /// Create an empty board, seeding the transcript with the configured greeting
    pub fn new(config: WhiteboardConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Like [`GraphStore::new`] but with a reproducible placement fallback
    pub fn with_seed(config: WhiteboardConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WhiteboardConfig, rng: StdRng) -> Self {
        let mut transcript = ChatTranscript::new();
        if let Some(greeting) = &config.greeting {
            transcript.push(ChatRole::Ai, greeting.clone());
        }
        let graph = WhiteboardGraph::new();
        let snapshot = Arc::new(GraphSnapshot::capture(&graph, &transcript, 0));

        Self {
            config,
            graph,
            transcript,
            snapshot,
            listeners: Vec::new(),
            next_subscription: 0,
            log: VecDeque::new(),
            last_published: None,
            sequence: 0,
            rng,
        }
    }

    /// Wrap the store for sharing with async sessions
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &WhiteboardConfig {
        &self.config
    }

    pub fn graph(&self) -> &WhiteboardGraph {
        &self.graph
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// The snapshot published with the latest event
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Sequence number of the latest event, 0 before the first mutation
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Recently recorded events, oldest first
    pub fn event_log(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.log.iter()
    }

    /// What the generator should be told about the board
    pub fn generator_context(&self) -> GeneratorContext {
        GeneratorContext::from_graph(&self.graph)
    }

    /// Register a listener for every future mutation
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&RecordedEvent, &GraphSnapshot) + Send + Sync + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Apply a batch of canvas node changes.
    ///
    /// A batch containing any removal deletes the cascading closure of every
    /// removed id and relayouts; its other changes are dropped. Otherwise
    /// positions and selection are updated in place. Unknown ids are ignored.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        let removals: Vec<NodeId> = changes
            .iter()
            .filter_map(|change| match change {
                NodeChange::Remove { id } => Some(id.clone()),
                _ => None,
            })
            .collect();
        if !removals.is_empty() {
            self.delete_nodes(&removals, true);
            return;
        }

        let pin_dragged = self.config.pin_dragged_nodes;
        let mut event = NodesChanged {
            moved: Vec::new(),
            selected: Vec::new(),
            pinned: Vec::new(),
        };

        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(node) = self.graph.node_mut(id) {
                        node.position = *position;
                        event.moved.push(id.clone());
                        if pin_dragged && !node.pinned {
                            node.pinned = true;
                            event.pinned.push(id.clone());
                        }
                    }
                }
                NodeChange::Select { id, selected } => {
                    if let Some(node) = self.graph.node_mut(id) {
                        if node.selected != *selected {
                            node.selected = *selected;
                            event.selected.push(id.clone());
                        }
                    }
                }
                NodeChange::Remove { .. } => {}
            }
        }

        if event.moved.is_empty() && event.selected.is_empty() {
            return;
        }
        self.publish(GraphEvent::NodesChanged(event));
    }

    /// Apply a batch of canvas edge changes. Removing edges never cascades.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        let mut working = self.graph.clone();
        let mut removed: Vec<EdgeId> = Vec::new();
        let mut selected: Vec<EdgeId> = Vec::new();

        for change in changes {
            match change {
                EdgeChange::Remove { id } => {
                    if working.remove_edge(id).is_some() {
                        removed.push(id.clone());
                    }
                }
                EdgeChange::Select { id, selected: flag } => {
                    if let Some(edge) = working.edge_mut(id) {
                        if edge.selected != *flag {
                            edge.selected = *flag;
                            selected.push(id.clone());
                        }
                    }
                }
            }
        }

        if !removed.is_empty() {
            self.commit(working, true);
            self.publish(GraphEvent::EdgesRemoved(EdgesRemoved { edge_ids: removed }));
        } else if !selected.is_empty() {
            self.graph = working;
            self.publish(GraphEvent::EdgesChanged(EdgesChanged { edge_ids: selected }));
        }
    }

    /// Connect two existing nodes with a new animated smoothstep edge.
    ///
    /// Parallel edges are allowed. Returns `None` if an endpoint is missing.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Option<EdgeId> {
        if !self.graph.contains_node(source) || !self.graph.contains_node(target) {
            debug!(%source, %target, "ignoring connect with unknown endpoint");
            return None;
        }

        let edge = WhiteboardEdge::new(EdgeId::generate(), source.clone(), target.clone());
        let edge_id = edge.id.clone();
        let mut working = self.graph.clone();
        working.insert_edge(edge);
        self.commit(working, true);

        self.publish(GraphEvent::EdgeConnected(EdgeConnected {
            edge_id: edge_id.clone(),
            source: source.clone(),
            target: target.clone(),
        }));
        Some(edge_id)
    }

    /// Delete exactly `ids` and their edges, without relayout
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        self.delete_nodes(ids, false)
    }

    /// Delete `ids`, plus every descendant when `cascade` is set.
    ///
    /// Cascading deletes relayout; direct deletes leave positions alone.
    /// Returns the ids actually removed, in board order.
    pub fn delete_nodes(&mut self, ids: &[NodeId], cascade: bool) -> Vec<NodeId> {
        let next = if cascade {
            hierarchy::cascade_delete(&self.graph, ids)
        } else {
            hierarchy::direct_delete(&self.graph, ids)
        };
        let removed: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|node| !next.contains_node(&node.id))
            .map(|node| node.id.clone())
            .collect();
        if removed.is_empty() {
            debug!(requested = ids.len(), "no nodes to delete");
            return removed;
        }

        let removed_edges = self.graph.edge_count() - next.edge_count();
        self.commit(next, cascade);
        debug!(removed = removed.len(), removed_edges, cascade, "deleted nodes");

        self.publish(GraphEvent::NodesRemoved(NodesRemoved {
            node_ids: removed.clone(),
            cascade,
            removed_edges,
        }));
        removed
    }

    /// Merge nodes and edges whose ids are not yet on the board
    pub fn merge_fragment(
        &mut self,
        nodes: Vec<WhiteboardNode>,
        edges: Vec<WhiteboardEdge>,
    ) -> FragmentResult<FragmentMerged> {
        self.apply_fragment(&ValidatedFragment::additions(nodes, edges))
    }

    /// Apply a validated generator fragment atomically.
    ///
    /// A reset clears the board first; otherwise listed deletions cascade.
    /// The merge then adds only unseen ids. On error the board is untouched.
    pub fn apply_fragment(&mut self, fragment: &ValidatedFragment) -> FragmentResult<FragmentMerged> {
        let mut working = self.graph.clone();
        let mut deleted_nodes = Vec::new();

        if fragment.should_reset {
            working.clear();
        } else if !fragment.deleted_node_ids.is_empty() {
            let next = hierarchy::cascade_delete(&working, &fragment.deleted_node_ids);
            deleted_nodes = working
                .nodes()
                .filter(|node| !next.contains_node(&node.id))
                .map(|node| node.id.clone())
                .collect();
            working = next;
        }

        let mut plan = plan_merge(
            &working,
            &fragment.nodes,
            &fragment.edges,
            self.config.merge.dangling_edges,
        )
        .map_err(|err| {
            warn!(error = %err, "rejected fragment");
            err
        })?;

        if self.config.workspace == WorkspaceMode::Brainstorm {
            let placement = &self.config.placement;
            let start = working.node_count();
            for (offset, node) in plan.nodes.iter_mut().enumerate() {
                node.kind = NodeKind::Sticky;
                node.position = spiral_position(start + offset, placement.spiral_center, placement.spiral_scale);
            }
        }

        let merged = FragmentMerged {
            reset: fragment.should_reset,
            deleted_nodes,
            added_nodes: plan.added_node_ids(),
            added_edges: plan.added_edge_ids(),
            dropped_edges: plan.dropped_edges.clone(),
        };
        if !merged.reset && merged.deleted_nodes.is_empty() && plan.is_empty() {
            debug!("fragment contained nothing new");
            return Ok(merged);
        }

        plan.apply_to(&mut working);
        self.commit(working, true);
        info!(
            reset = merged.reset,
            deleted = merged.deleted_nodes.len(),
            added_nodes = merged.added_nodes.len(),
            added_edges = merged.added_edges.len(),
            dropped_edges = merged.dropped_edges.len(),
            "merged fragment"
        );

        self.publish(GraphEvent::FragmentMerged(merged.clone()));
        Ok(merged)
    }

    /// Fold or unfold the subtree under `id`. Returns whether anything changed.
    pub fn toggle_fold(&mut self, id: &NodeId) -> bool {
        if !self.graph.has_children(id) {
            debug!(node = %id, "fold ignored for leaf or unknown node");
            return false;
        }

        self.graph = hierarchy::toggle_fold(&self.graph, id);
        let collapsed = self.graph.node(id).is_some_and(|node| node.collapsed);
        let hidden_nodes = self.graph.nodes().filter(|node| node.hidden).count();

        self.publish(GraphEvent::FoldToggled(FoldToggled {
            node_id: id.clone(),
            collapsed,
            hidden_nodes,
        }));
        true
    }

    /// Clear every node and edge; the chat transcript is kept
    pub fn reset(&mut self) {
        let event = GraphReset {
            removed_nodes: self.graph.node_count(),
            removed_edges: self.graph.edge_count(),
        };
        self.graph.clear();
        info!(removed_nodes = event.removed_nodes, removed_edges = event.removed_edges, "reset whiteboard");
        self.publish(GraphEvent::GraphReset(event));
    }

    /// Recompute the hierarchical layout, in the configured direction by default.
    /// Returns the number of nodes positioned.
    pub fn relayout(&mut self, direction: Option<LayoutDirection>) -> usize {
        let direction = direction.unwrap_or(self.config.layout.direction);
        let positioned = layout_into(&mut self.graph, &self.config.layout, direction);

        self.publish(GraphEvent::LayoutApplied(LayoutApplied {
            layout: LayoutKind::Hierarchical(direction),
            positioned,
            added_nodes: Vec::new(),
        }));
        positioned
    }

    /// Arrange every node on a square grid in board order
    pub fn apply_grid_layout(&mut self) -> usize {
        let positions = GridLayout::from(&self.config.placement).compute(self.graph.nodes().map(|node| &node.id));
        self.graph.set_positions(&positions);

        self.publish(GraphEvent::LayoutApplied(LayoutApplied {
            layout: LayoutKind::Grid,
            positioned: positions.len(),
            added_nodes: Vec::new(),
        }));
        positions.len()
    }

    /// Arrange nodes into side-by-side groups, optionally adding a pinned
    /// title node above each group. Returns the ids of the title nodes.
    pub fn apply_cluster_layout(
        &mut self,
        groups: &[ClusterGroup],
        with_titles: bool,
    ) -> GraphCommandResult<Vec<NodeId>> {
        if groups.is_empty() {
            return Err(GraphCommandError::InvalidCommand(
                "cluster layout needs at least one group".to_string(),
            ));
        }

        let plan = ClusterLayout::from(&self.config.placement).compute(&self.graph, groups, with_titles);
        let mut working = self.graph.clone();
        working.set_positions(&plan.positions);
        let title_ids: Vec<NodeId> = plan.titles.iter().map(|title| title.id.clone()).collect();
        for title in plan.titles {
            working.insert_node(title);
        }
        self.commit(working, false);

        self.publish(GraphEvent::LayoutApplied(LayoutApplied {
            layout: LayoutKind::Cluster,
            positioned: plan.positions.len(),
            added_nodes: title_ids.clone(),
        }));
        Ok(title_ids)
    }

    /// Place one sticky note per label around `anchor` (or the spiral center)
    /// without overlapping existing nodes or each other.
    pub fn scatter_ideas(&mut self, anchor: Option<&NodeId>, labels: &[String]) -> GraphCommandResult<Vec<NodeId>> {
        let center = match anchor {
            Some(id) => self
                .graph
                .node(id)
                .map(|node| node.position)
                .ok_or_else(|| GraphCommandError::NodeNotFound(id.clone()))?,
            None => self.config.placement.spiral_center,
        };
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let search = SpiralSearch::from(&self.config.placement);
        let size = self.config.placement.idea_size;
        let mut occupied: Vec<Position2D> = self.graph.nodes().map(|node| node.position).collect();
        let mut working = self.graph.clone();
        let mut ids = Vec::with_capacity(labels.len());

        for label in labels {
            let position = search.find(&occupied, center, size, &mut self.rng);
            let node = WhiteboardNode::new(NodeId::generate("idea"), label.clone(), NodeKind::Sticky).at(position);
            occupied.push(position);
            ids.push(node.id.clone());
            working.insert_node(node);
        }
        self.commit(working, true);

        self.publish(GraphEvent::IdeasPlaced(IdeasPlaced {
            anchor: anchor.cloned(),
            node_ids: ids.clone(),
        }));
        Ok(ids)
    }

    /// Append a chat message. Returns its id.
    pub fn append_message(&mut self, role: ChatRole, content: impl Into<String>) -> Uuid {
        let message_id = self.transcript.push(role, content).id;
        self.publish(GraphEvent::MessageAppended(MessageAppended { message_id, role }));
        message_id
    }

    /// Execute a command, returning the last event it published (if any)
    pub fn execute(&mut self, command: GraphCommand) -> GraphCommandResult<Option<RecordedEvent>> {
        let before = self.sequence;

        match command {
            GraphCommand::ApplyNodeChanges { changes } => self.apply_node_changes(&changes),
            GraphCommand::ApplyEdgeChanges { changes } => self.apply_edge_changes(&changes),
            GraphCommand::Connect { source, target } => {
                if let Some(missing) = [&source, &target]
                    .into_iter()
                    .find(|id| !self.graph.contains_node(id))
                {
                    return Err(GraphCommandError::NodeNotFound(missing.clone()));
                }
                self.connect(&source, &target);
            }
            GraphCommand::DeleteNodes { ids, cascade } => {
                self.delete_nodes(&ids, cascade);
            }
            GraphCommand::MergeFragment { nodes, edges } => {
                self.merge_fragment(nodes, edges)?;
            }
            GraphCommand::ToggleFold { id } => {
                self.toggle_fold(&id);
            }
            GraphCommand::Reset => self.reset(),
            GraphCommand::Relayout { direction } => {
                self.relayout(direction);
            }
            GraphCommand::GridLayout => {
                self.apply_grid_layout();
            }
            GraphCommand::ClusterLayout { groups, with_titles } => {
                self.apply_cluster_layout(&groups, with_titles)?;
            }
            GraphCommand::ScatterIdeas { anchor, labels } => {
                self.scatter_ideas(anchor.as_ref(), &labels)?;
            }
            GraphCommand::AppendMessage { role, content } => {
                self.append_message(role, content);
            }
        }

        Ok(self
            .last_published
            .clone()
            .filter(|recorded| recorded.sequence > before))
    }

    /// Install `graph` as the live graph, recomputing visibility and, when
    /// asked, the hierarchical layout.
    fn commit(&mut self, graph: WhiteboardGraph, relayout: bool) {
        let mut graph = hierarchy::recompute_visibility(&graph);
        if relayout {
            layout_into(&mut graph, &self.config.layout, self.config.layout.direction);
        }
        self.graph = graph;
    }

    /// Record `event`, refresh the snapshot and notify listeners
    fn publish(&mut self, event: GraphEvent) {
        self.sequence += 1;
        let recorded = RecordedEvent {
            sequence: self.sequence,
            recorded_at: Utc::now(),
            event,
        };
        debug!(
            sequence = recorded.sequence,
            subject = %recorded.event.subject(),
            "published whiteboard event"
        );

        self.snapshot = Arc::new(GraphSnapshot::capture(&self.graph, &self.transcript, self.sequence));

        let capacity = self.config.event_log_capacity;
        if capacity > 0 {
            self.log.push_back(recorded.clone());
            while self.log.len() > capacity {
                self.log.pop_front();
            }
        }

        for (_, listener) in &self.listeners {
            listener(&recorded, &self.snapshot);
        }
        self.last_published = Some(recorded);
    }
}

/// Write layered positions for every auto-laid-out node of `graph`
fn layout_into(graph: &mut WhiteboardGraph, config: &LayoutConfig, direction: LayoutDirection) -> usize {
    let positions = LayeredLayout::from(config).compute(graph, direction);
    graph.set_positions(&positions);
    positions.len()
}
