//! Store configuration
//!
//! Every field has a default, so a partial JSON document (or none at all) is
//! a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::value_objects::{LayoutDirection, Position2D, Size};

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Which kind of board the store drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceMode {
    /// Hierarchical architecture diagrams
    #[default]
    Structure,
    /// Free-form sticky notes placed on a spiral
    Brainstorm,
}

/// What to do with a fragment edge whose endpoint exists nowhere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingEdgePolicy {
    /// Drop the edge; the rest of the fragment still merges
    #[default]
    DropEdge,
    /// Reject the whole fragment
    RejectFragment,
}

/// Hierarchical layout tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Direction used by automatic relayouts
    pub direction: LayoutDirection,
    /// Distance between consecutive ranks on the primary axis
    pub rank_spacing: f64,
    /// Distance between neighbours within a rank
    pub node_spacing: f64,
    /// Extra space between disconnected components
    pub component_gap: f64,
    /// Upper bound on barycenter sweeps
    pub crossing_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::LeftToRight,
            rank_spacing: 250.0,
            node_spacing: 100.0,
            component_gap: 100.0,
            crossing_passes: 8,
        }
    }
}

/// Spatial placement tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Radius multiplier for golden-angle spiral placement
    pub spiral_scale: f64,
    /// Center of the idea spiral
    pub spiral_center: Position2D,
    /// Footprint of a sticky note
    pub idea_size: Size,
    /// Added to the larger idea dimension to get the separation distance
    pub separation_margin: f64,
    /// Candidate positions tried before the random fallback
    pub max_iterations: usize,
    /// Width of the square the random fallback lands in
    pub fallback_spread: f64,
    /// Grid cell edge length
    pub grid_cell: f64,
    /// Gap between grid cells
    pub grid_gap: f64,
    /// Distance between members of a cluster
    pub cluster_spacing: f64,
    /// Space between neighbouring clusters
    pub cluster_padding: f64,
    /// How far a cluster title sits above its first member
    pub title_offset: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            spiral_scale: 250.0,
            spiral_center: Position2D::default(),
            idea_size: Size::default(),
            separation_margin: 50.0,
            max_iterations: 100,
            fallback_spread: 1000.0,
            grid_cell: 280.0,
            grid_gap: 40.0,
            cluster_spacing: 220.0,
            cluster_padding: 300.0,
            title_offset: 80.0,
        }
    }
}

/// Fragment merge tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub dangling_edges: DanglingEdgePolicy,
}

/// Top-level configuration of a [`GraphStore`](crate::store::GraphStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboardConfig {
    pub workspace: WorkspaceMode,
    pub layout: LayoutConfig,
    pub placement: PlacementConfig,
    pub merge: MergeConfig,
    /// Dragging a node pins it so later relayouts leave it in place
    pub pin_dragged_nodes: bool,
    /// Number of mutation events kept in the in-memory log
    pub event_log_capacity: usize,
    /// First AI message in a fresh transcript
    pub greeting: Option<String>,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceMode::Structure,
            layout: LayoutConfig::default(),
            placement: PlacementConfig::default(),
            merge: MergeConfig::default(),
            pin_dragged_nodes: false,
            event_log_capacity: 256,
            greeting: Some(
                "Hello! I am your whiteboard assistant. Tell me what to draw or explain a concept, and I will visualize it for you."
                    .to_string(),
            ),
        }
    }
}

impl WhiteboardConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Builder-style workspace override
    pub fn with_workspace(mut self, workspace: WorkspaceMode) -> Self {
        self.workspace = workspace;
        self
    }

    /// Reject values the layout code cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spacings = [
            ("layout.rank_spacing", self.layout.rank_spacing),
            ("layout.node_spacing", self.layout.node_spacing),
            ("placement.spiral_scale", self.placement.spiral_scale),
            ("placement.grid_cell", self.placement.grid_cell),
            ("placement.cluster_spacing", self.placement.cluster_spacing),
        ];
        for (name, value) in spacings {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !self.placement.fallback_spread.is_finite() || self.placement.fallback_spread < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "placement.fallback_spread must not be negative, got {}",
                self.placement.fallback_spread
            )));
        }
        if !self.placement.separation_margin.is_finite() {
            return Err(ConfigError::Invalid("placement.separation_margin must be finite".to_string()));
        }
        if self.placement.idea_size.width <= 0.0 || self.placement.idea_size.height <= 0.0 {
            return Err(ConfigError::Invalid("placement.idea_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = WhiteboardConfig::from_json_str("{}").unwrap();

        assert_eq!(config, WhiteboardConfig::default());
        assert_eq!(config.layout.direction, LayoutDirection::LeftToRight);
        assert_eq!(config.merge.dangling_edges, DanglingEdgePolicy::DropEdge);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config = WhiteboardConfig::from_json_str(
            r#"{
                "workspace": "brainstorm",
                "layout": { "direction": "TB", "rank_spacing": 120 },
                "merge": { "dangling_edges": "reject_fragment" },
                "pin_dragged_nodes": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.workspace, WorkspaceMode::Brainstorm);
        assert_eq!(config.layout.direction, LayoutDirection::TopToBottom);
        assert_eq!(config.layout.rank_spacing, 120.0);
        assert_eq!(config.layout.node_spacing, 100.0);
        assert_eq!(config.merge.dangling_edges, DanglingEdgePolicy::RejectFragment);
        assert!(config.pin_dragged_nodes);
    }

    #[test]
    fn test_invalid_spacing_is_rejected() {
        let result = WhiteboardConfig::from_json_str(r#"{ "layout": { "node_spacing": 0 } }"#);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_fallback_spread_is_rejected() {
        let result = WhiteboardConfig::from_json_str(r#"{ "placement": { "fallback_spread": -10 } }"#);

        assert!(matches!(result, Err(ConfigError::Invalid(message)) if message.contains("fallback_spread")));
        assert!(WhiteboardConfig::from_json_str(r#"{ "placement": { "fallback_spread": 0 } }"#).is_ok());
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let result = WhiteboardConfig::from_json_str("{ not json");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = WhiteboardConfig::from_path("/definitely/not/here.json").unwrap_err();

        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
