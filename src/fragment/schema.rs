//! Generator response schema
//!
//! Raw serde types accept the loose shapes real generators produce; validation
//! turns them into a [`ValidatedFragment`] of whiteboard nodes and edges.

use serde::Deserialize;
use serde_json::Value;

use super::extract::extract_json;
use super::{FragmentError, FragmentResult};
use crate::aggregate::{WhiteboardEdge, WhiteboardNode};
use crate::value_objects::{EdgeId, NodeId, NodeKind, Position2D};

/// Reply used when the generator does not provide one
pub const DEFAULT_REPLY: &str = "I have updated the whiteboard.";

#[derive(Debug, Default, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Option<Vec<RawNode>>,
    #[serde(default)]
    edges: Option<Vec<RawEdge>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    graph: Option<RawGraph>,
    #[serde(default)]
    nodes: Option<Vec<RawNode>>,
    #[serde(default)]
    edges: Option<Vec<RawEdge>>,
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    should_reset: bool,
    #[serde(default)]
    deleted_node_ids: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawNodeData {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    data: Option<RawNodeData>,
    #[serde(default, alias = "type")]
    kind: Option<String>,
    #[serde(default)]
    position: Option<Position2D>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    source: Option<Value>,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    label: Option<String>,
}

/// A generator response that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFragment {
    /// New nodes, first occurrence of each id only
    pub nodes: Vec<WhiteboardNode>,
    /// New edges, first occurrence of each id only
    pub edges: Vec<WhiteboardEdge>,
    /// Natural-language reply for the chat transcript
    pub reply: String,
    /// Clear the board before merging
    pub should_reset: bool,
    /// Nodes to delete (with their descendants) before merging
    pub deleted_node_ids: Vec<NodeId>,
}

impl ValidatedFragment {
    /// A fragment that only adds the given nodes and edges
    pub fn additions(nodes: Vec<WhiteboardNode>, edges: Vec<WhiteboardEdge>) -> Self {
        Self {
            nodes,
            edges,
            reply: DEFAULT_REPLY.to_string(),
            should_reset: false,
            deleted_node_ids: Vec::new(),
        }
    }
}

/// Ids may arrive as strings or numbers; anything else is rejected
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse raw generator text into a validated fragment.
///
/// `default_reply` is used when the response carries no reply.
pub fn parse_fragment(text: &str, default_reply: &str) -> FragmentResult<ValidatedFragment> {
    let json = extract_json(text);
    if json.is_empty() {
        return Err(FragmentError::Empty);
    }
    let raw: RawResponse = serde_json::from_str(json)?;
    validate(raw, default_reply)
}

fn validate(raw: RawResponse, default_reply: &str) -> FragmentResult<ValidatedFragment> {
    let RawResponse {
        graph,
        nodes,
        edges,
        reply,
        should_reset,
        deleted_node_ids,
    } = raw;
    let graph = graph.unwrap_or_default();

    let deleted_node_ids: Vec<NodeId> = deleted_node_ids
        .iter()
        .filter_map(id_text)
        .map(NodeId::from)
        .collect();

    // A reply on its own is a clarifying question and leaves the board alone
    let has_reply = reply.as_deref().is_some_and(|reply| !reply.trim().is_empty());
    let raw_nodes = match graph.nodes.or(nodes) {
        Some(nodes) => nodes,
        None if has_reply || should_reset || !deleted_node_ids.is_empty() => Vec::new(),
        None => return Err(FragmentError::MissingNodes),
    };
    let raw_edges = graph.edges.or(edges).unwrap_or_default();

    let mut validated_nodes: Vec<WhiteboardNode> = Vec::with_capacity(raw_nodes.len());
    for (index, raw_node) in raw_nodes.into_iter().enumerate() {
        let id = raw_node
            .id
            .as_ref()
            .and_then(id_text)
            .ok_or(FragmentError::MissingNodeId { index })?;
        if validated_nodes.iter().any(|node| node.id.as_str() == id) {
            continue;
        }
        let label = raw_node
            .label
            .or_else(|| raw_node.data.and_then(|data| data.label))
            .unwrap_or_else(|| id.clone());
        let kind = raw_node
            .kind
            .as_deref()
            .map(NodeKind::parse_lenient)
            .unwrap_or_default();
        let mut node = WhiteboardNode::new(id, label, kind);
        if let Some(position) = raw_node.position {
            node.position = position;
        }
        validated_nodes.push(node);
    }

    let mut validated_edges: Vec<WhiteboardEdge> = Vec::with_capacity(raw_edges.len());
    for (index, raw_edge) in raw_edges.into_iter().enumerate() {
        let (Some(source), Some(target)) = (
            raw_edge.source.as_ref().and_then(id_text),
            raw_edge.target.as_ref().and_then(id_text),
        ) else {
            return Err(FragmentError::MissingEdgeEndpoint { index });
        };
        let (source, target) = (NodeId::from(source), NodeId::from(target));
        let id = raw_edge
            .id
            .as_ref()
            .and_then(id_text)
            .map(EdgeId::from)
            .unwrap_or_else(|| EdgeId::derived(&source, &target));
        if validated_edges.iter().any(|edge| edge.id == id) {
            continue;
        }
        let mut edge = WhiteboardEdge::new(id, source, target);
        edge.label = raw_edge.label.filter(|label| !label.is_empty());
        validated_edges.push(edge);
    }

    Ok(ValidatedFragment {
        nodes: validated_nodes,
        edges: validated_edges,
        reply: reply
            .filter(|reply| !reply.trim().is_empty())
            .unwrap_or_else(|| default_reply.to_string()),
        should_reset,
        deleted_node_ids,
    })
}
