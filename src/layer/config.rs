//! Configuration for the obstacle layer.
//!
//! The configuration is an immutable snapshot swapped atomically between
//! update cycles, never mutated in place mid-cycle. An invalid update is
//! rejected and the prior snapshot stays in effect.

use crate::core::{CombinationMethod, WorldPoint};
use crate::error::LayerError;
use serde::{Deserialize, Serialize};

/// Geometry of the layer's private cost grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Meters per cell
    pub resolution: f32,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// World coordinates of cell (0,0) corner.
    /// If None, the grid is centered at the world origin.
    pub origin: Option<WorldPoint>,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            resolution: 0.05, // 5cm cells
            width: 200,       // 10m at 5cm
            height: 200,
            origin: None,
        }
    }
}

impl GridGeometry {
    /// Get the effective origin (centered when origin is None).
    pub fn effective_origin(&self) -> WorldPoint {
        self.origin.unwrap_or_else(|| {
            WorldPoint::new(
                -(self.width as f32 * self.resolution) / 2.0,
                -(self.height as f32 * self.resolution) / 2.0,
            )
        })
    }
}

/// Obstacle layer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObstacleLayerConfig {
    /// Grid geometry of the layer's cost array
    pub grid: GridGeometry,

    /// Points above this height are ignored by the marking engine (meters)
    pub max_obstacle_height: f32,

    /// Maximum distance at which a point is trusted as a real obstacle (meters)
    pub obstacle_range: f32,

    /// Maximum distance along a ray considered reliably known free (meters)
    pub raytrace_range: f32,

    /// Age after which a remembered obstacle is expired and re-cleared (seconds)
    pub obstacle_lifespan: f32,

    /// Remembered obstacles farther than this from the robot are expired
    /// regardless of age (meters)
    pub obstacle_keep_radius: f32,

    /// Maximum observations retained per sensor buffer
    pub obstacle_queue_size: usize,

    /// A re-marked obstacle whose position moved more than this is treated
    /// as the same obstacle having moved, not a new one (meters)
    pub obstacle_compare_tolerance: f32,

    /// Below this pose confidence, marking does not create or refresh
    /// memory entries
    pub pose_confidence_threshold: f32,

    /// Policy for merging this layer into the master grid
    pub combination_method: CombinationMethod,

    /// Clear the cells under the robot footprint before processing observations
    pub footprint_clearing_enabled: bool,

    /// Keep the grid window centered on the robot
    pub rolling_window: bool,

    /// Enable the forgetful obstacle memory
    pub use_obstacle_memory: bool,
}

impl Default for ObstacleLayerConfig {
    fn default() -> Self {
        Self {
            grid: GridGeometry::default(),
            max_obstacle_height: 2.0,
            obstacle_range: 2.5,
            raytrace_range: 3.0,
            obstacle_lifespan: 30.0,
            obstacle_keep_radius: 5.0,
            obstacle_queue_size: 10,
            obstacle_compare_tolerance: 0.02,
            pose_confidence_threshold: 0.5,
            combination_method: CombinationMethod::Maximum,
            footprint_clearing_enabled: true,
            rolling_window: false,
            use_obstacle_memory: false,
        }
    }
}

impl ObstacleLayerConfig {
    /// Check the configuration for values the layer cannot run with.
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.grid.resolution <= 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.grid.resolution
            )));
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(LayerError::InvalidConfig(
                "grid dimensions must be non-zero".into(),
            ));
        }
        if self.obstacle_range < 0.0 || self.raytrace_range < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "ranges must be non-negative, got obstacle_range={} raytrace_range={}",
                self.obstacle_range, self.raytrace_range
            )));
        }
        if self.obstacle_lifespan < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "obstacle_lifespan must be non-negative, got {}",
                self.obstacle_lifespan
            )));
        }
        if self.obstacle_keep_radius < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "obstacle_keep_radius must be non-negative, got {}",
                self.obstacle_keep_radius
            )));
        }
        if self.obstacle_compare_tolerance < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "obstacle_compare_tolerance must be non-negative, got {}",
                self.obstacle_compare_tolerance
            )));
        }
        if self.obstacle_queue_size == 0 {
            return Err(LayerError::InvalidConfig(
                "obstacle_queue_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self, LayerError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, LayerError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, LayerError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Obstacle lifespan in microseconds.
    #[inline]
    pub fn obstacle_lifespan_us(&self) -> u64 {
        (self.obstacle_lifespan as f64 * 1e6) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ObstacleLayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_lifespan_rejected() {
        let config = ObstacleLayerConfig {
            obstacle_lifespan: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_queue_rejected() {
        let config = ObstacleLayerConfig {
            obstacle_queue_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_centered_origin() {
        let geometry = GridGeometry::default();
        let origin = geometry.effective_origin();
        assert!((origin.x + 5.0).abs() < 1e-6);
        assert!((origin.y + 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ObstacleLayerConfig {
            use_obstacle_memory: true,
            combination_method: CombinationMethod::Overwrite,
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        let parsed = ObstacleLayerConfig::from_yaml(&yaml).unwrap();
        assert!(parsed.use_obstacle_memory);
        assert_eq!(parsed.combination_method, CombinationMethod::Overwrite);
        assert_eq!(parsed.obstacle_range, config.obstacle_range);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obstacle_layer.yaml");
        let config = ObstacleLayerConfig {
            obstacle_lifespan: 12.5,
            ..Default::default()
        };
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();

        let loaded = ObstacleLayerConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.obstacle_lifespan, 12.5);
    }

    #[test]
    fn test_yaml_invalid_rejected() {
        let config = ObstacleLayerConfig {
            obstacle_lifespan: -5.0,
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert!(ObstacleLayerConfig::from_yaml(&yaml).is_err());
    }
}
