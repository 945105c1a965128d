//! Whiteboard value objects
//!
//! Value objects are immutable types that represent concepts in the whiteboard domain.
//! They are compared by value rather than identity and encapsulate domain validation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a whiteboard node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id with the given prefix
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Stable identifier of a whiteboard edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create an edge id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, unique edge id
    pub fn generate() -> Self {
        Self(format!("edge-{}", uuid::Uuid::new_v4().simple()))
    }

    /// The id fragments use when the generator omits one
    pub fn derived(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("edge-{source}-{target}"))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Visual category of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// General concept, step or action
    #[default]
    Default,
    /// Free-form idea note; skipped by the hierarchical layout
    Sticky,
    /// People, positions, teams, stakeholders
    Role,
    /// Technologies, tools, platforms
    Tech,
    /// Constraints, risks, negative factors
    Risk,
}

impl NodeKind {
    /// Parse a node kind leniently; unknown values fall back to `Default`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sticky" | "sticky-note" | "sticky_note" => NodeKind::Sticky,
            "role" => NodeKind::Role,
            "tech" => NodeKind::Tech,
            "risk" => NodeKind::Risk,
            _ => NodeKind::Default,
        }
    }

    /// Get the string representation of the node kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Default => "default",
            NodeKind::Sticky => "sticky",
            NodeKind::Role => "role",
            NodeKind::Tech => "tech",
            NodeKind::Risk => "risk",
        }
    }

    /// Whether nodes of this kind take part in the hierarchical layout
    pub fn is_hierarchical(&self) -> bool {
        !matches!(self, NodeKind::Sticky)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the rendering surface draws an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    SmoothStep,
}

/// Primary axis of the hierarchical layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Ranks advance along x
    #[default]
    #[serde(rename = "LR")]
    LeftToRight,
    /// Ranks advance along y
    #[serde(rename = "TB")]
    TopToBottom,
}

/// Represents the position of a node in 2D canvas space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Get the distance to another position
    pub fn distance_to(&self, other: &Position2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Offset this position by a delta
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Represents the footprint of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub fn new(width: f64, height: f64) -> Result<Self, String> {
        if width <= 0.0 || height <= 0.0 {
            return Err("Size dimensions must be positive".to_string());
        }
        Ok(Self { width, height })
    }

    /// The larger of the two dimensions
    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_lenient_parse() {
        assert_eq!(NodeKind::parse_lenient("tech"), NodeKind::Tech);
        assert_eq!(NodeKind::parse_lenient("RISK"), NodeKind::Risk);
        assert_eq!(NodeKind::parse_lenient("sticky-note"), NodeKind::Sticky);
        assert_eq!(NodeKind::parse_lenient("gizmo"), NodeKind::Default);
    }

    #[test]
    fn test_sticky_skips_hierarchy() {
        assert!(!NodeKind::Sticky.is_hierarchical());
        assert!(NodeKind::Role.is_hierarchical());
    }

    #[test]
    fn test_derived_edge_id() {
        let id = EdgeId::derived(&NodeId::from("a"), &NodeId::from("b"));
        assert_eq!(id.as_str(), "edge-a-b");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(EdgeId::generate(), EdgeId::generate());
        assert!(NodeId::generate("idea").as_str().starts_with("idea-"));
    }

    #[test]
    fn test_position_distance() {
        let pos1 = Position2D::new(0.0, 0.0);
        let pos2 = Position2D::new(3.0, 4.0);

        assert_eq!(pos1.distance_to(&pos2), 5.0);
    }

    #[test]
    fn test_size_validation() {
        assert!(Size::new(10.0, 20.0).is_ok());
        assert!(Size::new(-1.0, 20.0).is_err());
        assert_eq!(Size::new(10.0, 30.0).map(|s| s.max_side()), Ok(30.0));
    }

    #[test]
    fn test_serialization() {
        let direction: LayoutDirection = serde_json::from_str("\"TB\"").unwrap();
        assert_eq!(direction, LayoutDirection::TopToBottom);

        let kind = serde_json::to_string(&NodeKind::Sticky).unwrap();
        assert_eq!(kind, "\"sticky\"");

        let id: NodeId = serde_json::from_str("\"n1\"").unwrap();
        assert_eq!(id, NodeId::from("n1"));
    }
}
