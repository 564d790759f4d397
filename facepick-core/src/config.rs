//! Tunable thresholds for face grouping and classification.
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How candidate triangles are admitted into a growing face region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStrategy {
    /// Accept when `dot(candidate_normal, seed_normal) > normal_threshold`.
    #[default]
    NormalSimilarity,
    /// Accept when every corner lies within `plane_tolerance` of the seed plane.
    PlaneDistance,
}

/// Which edges describe a face outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Edges used by exactly one region triangle, traced into ordered loops.
    #[default]
    Boundary,
    /// Every pair of distinct region vertices.
    Pairwise,
}

/// An RGB display colour, serialized as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeColor(pub u32);

impl EdgeColor {
    pub fn rgb(&self) -> (u8, u8, u8) {
        let [_, r, g, b] = self.0.to_be_bytes();
        (r, g, b)
    }
}

impl fmt::Display for EdgeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

pub const DEFAULT_PALETTE: [EdgeColor; 8] = [
    EdgeColor(0xff4d4d),
    EdgeColor(0x4dff88),
    EdgeColor(0x4d88ff),
    EdgeColor(0xffd24d),
    EdgeColor(0xff4dd2),
    EdgeColor(0x4de1ff),
    EdgeColor(0xff964d),
    EdgeColor(0xa64dff),
];

/// Configuration for the selection pipeline. Every field falls back to
/// its default when missing from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub strategy: GrowthStrategy,
    /// Minimum normal dot product (exclusive), about 18 degrees at 0.95.
    pub normal_threshold: f32,
    /// Maximum distance from the seed plane, in mesh units.
    pub plane_tolerance: f32,
    pub edge_policy: EdgePolicy,
    pub circle_min_vertices: usize,
    /// Allowed standard deviation of centroid distances, relative to their mean.
    pub circularity_tolerance: f32,
    /// Allowed deviation from a right angle, in radians.
    pub rectangle_angle_tolerance: f32,
    pub palette: Vec<EdgeColor>,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            strategy: GrowthStrategy::NormalSimilarity,
            normal_threshold: 0.95,
            plane_tolerance: 0.01,
            edge_policy: EdgePolicy::Boundary,
            circle_min_vertices: 8,
            circularity_tolerance: 0.01,
            rectangle_angle_tolerance: 0.1,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl MeasureConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.normal_threshold) {
            return Err(ConfigError::Invalid {
                field: "normal_threshold",
                reason: format!("{} is outside [-1, 1]", self.normal_threshold),
            });
        }
        let tolerances = [
            ("plane_tolerance", self.plane_tolerance),
            ("circularity_tolerance", self.circularity_tolerance),
            ("rectangle_angle_tolerance", self.rectangle_angle_tolerance),
        ];
        for (field, value) in tolerances {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} must be a finite non-negative number"),
                });
            }
        }
        if self.palette.is_empty() {
            return Err(ConfigError::Invalid {
                field: "palette",
                reason: "must contain at least one colour".to_string(),
            });
        }
        Ok(())
    }

    /// Display colour for the edge with the given id.
    pub fn edge_color(&self, id: usize) -> EdgeColor {
        if self.palette.is_empty() {
            DEFAULT_PALETTE[id % DEFAULT_PALETTE.len()]
        } else {
            self.palette[id % self.palette.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MeasureConfig::default();
        assert_eq!(config.normal_threshold, 0.95);
        assert_eq!(config.palette.len(), 8);
        assert_eq!(config.edge_policy, EdgePolicy::Boundary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MeasureConfig::from_toml_str(
            r#"
            strategy = "plane_distance"
            plane_tolerance = 0.05
            edge_policy = "pairwise"
            palette = [0xff0000, 0x00ff00]
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, GrowthStrategy::PlaneDistance);
        assert_eq!(config.plane_tolerance, 0.05);
        assert_eq!(config.edge_policy, EdgePolicy::Pairwise);
        assert_eq!(config.normal_threshold, 0.95);
        assert_eq!(config.edge_color(3), EdgeColor(0x00ff00));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MeasureConfig::from_toml_str("normal_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "normal_threshold", .. }));

        let err = MeasureConfig::from_toml_str("palette = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "palette", .. }));

        let err = MeasureConfig::from_toml_str("plane_tolerance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "plane_tolerance", .. }));

        let err = MeasureConfig::from_toml_str("strategy = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_palette_cycles() {
        let config = MeasureConfig::default();
        assert_eq!(config.edge_color(0), config.edge_color(8));
        assert_ne!(config.edge_color(0), config.edge_color(1));
    }

    #[test]
    fn test_color_formatting() {
        let color = EdgeColor(0x4d88ff);
        assert_eq!(color.to_string(), "#4d88ff");
        assert_eq!(color.rgb(), (0x4d, 0x88, 0xff));
    }

    #[test]
    fn test_missing_file() {
        let err = MeasureConfig::from_file("/nonexistent/facepick.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
