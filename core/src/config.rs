//! Tunable constants for the authoring engine.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use crate::sketch::snap::SnapConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    /// Generic constraint tool: max distance to a line.
    pub line_pick_threshold: f64,
    /// Generic constraint tool: max distance to a point.
    pub point_pick_threshold: f64,
    /// Dimension and measure tools: max distance to any candidate.
    pub entity_pick_threshold: f64,
    /// Horizontal/vertical/parallel/perpendicular inference window, degrees.
    pub angle_snap_tolerance_deg: f64,
    pub polygon_sides: usize,
    /// Slot width as a fraction of the center-to-center length.
    pub slot_width_ratio: f64,
    /// Distance of a dimension line from what it measures, before the style offset.
    pub dimension_base_offset: f64,
    /// Half extent of a dimension hitbox, in sketch units.
    pub hitbox_size: f64,
    /// Ray-to-segment distance under which a solid edge counts as hit.
    pub edge_pick_tolerance: f64,
    pub vertex_pick_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap: SnapConfig::default(),
            line_pick_threshold: 2.0,
            point_pick_threshold: 1.5,
            entity_pick_threshold: 0.5,
            angle_snap_tolerance_deg: 3.0,
            polygon_sides: 6,
            slot_width_ratio: 0.5,
            dimension_base_offset: 1.0,
            hitbox_size: 0.6,
            edge_pick_tolerance: 0.05,
            vertex_pick_tolerance: 0.08,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polygon_sides < 3 {
            return Err(ConfigError::Invalid(format!("polygon_sides must be >= 3, got {}", self.polygon_sides)));
        }
        if !(self.slot_width_ratio > 0.0) {
            return Err(ConfigError::Invalid("slot_width_ratio must be positive".into()));
        }
        let thresholds = [
            ("line_pick_threshold", self.line_pick_threshold),
            ("point_pick_threshold", self.point_pick_threshold),
            ("entity_pick_threshold", self.entity_pick_threshold),
            ("hitbox_size", self.hitbox_size),
            ("snap.snap_radius", self.snap.snap_radius),
        ];
        for (name, value) in thresholds {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        Ok(())
    }
}
