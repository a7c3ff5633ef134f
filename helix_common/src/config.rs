//! Machine limit configuration and TOML loading.
//!
//! The canonical layer needs, per axis: maximum velocity, acceleration,
//! and jerk (all in external units), plus the axis-enable mask, the
//! external unit scales, and optional tool-change behavior. Axes absent
//! from the configuration are absent from the mask.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::axis::AxisMask;
use crate::consts::{AXIS_COUNT, DEFAULT_POCKETS_MAX};
use crate::pose::Pose;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Kinematic limits for one axis, in external units per second (squared,
/// cubed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimitConfig {
    /// Axis number, 0..=8 mapping X, Y, Z, A, B, C, U, V, W.
    pub axis: usize,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    #[serde(default = "default_max_jerk")]
    pub max_jerk: f64,
}

fn default_max_jerk() -> f64 {
    1e4
}

/// Machine-level configuration loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Per-axis limits; presence of an axis here enables it in the mask.
    pub axes: Vec<AxisLimitConfig>,

    /// External length units per millimeter (1.0 for a mm machine,
    /// 1/25.4 for an inch machine).
    #[serde(default = "default_unit_scale")]
    pub external_length_units: f64,

    /// External angle units per degree.
    #[serde(default = "default_unit_scale")]
    pub external_angle_units: f64,

    /// Optional fixed position (external units) visited before tool load.
    #[serde(default)]
    pub tool_change_position: Option<Pose>,

    /// Tool table capacity; pocket 0 is the spindle.
    #[serde(default = "default_pockets_max")]
    pub pockets_max: usize,
}

fn default_unit_scale() -> f64 {
    1.0
}

fn default_pockets_max() -> usize {
    DEFAULT_POCKETS_MAX
}

impl MachineConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.axes.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one axis must be configured".to_string(),
            ));
        }
        for axis in &self.axes {
            if axis.axis >= AXIS_COUNT {
                return Err(ConfigError::ValidationError(format!(
                    "axis number {} out of range [0, {}]",
                    axis.axis,
                    AXIS_COUNT - 1
                )));
            }
            if axis.max_velocity <= 0.0 || axis.max_acceleration <= 0.0 || axis.max_jerk <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "axis {} limits must be positive",
                    axis.axis
                )));
            }
        }
        if self.external_length_units <= 0.0 || self.external_angle_units <= 0.0 {
            return Err(ConfigError::ValidationError(
                "external unit scales must be positive".to_string(),
            ));
        }
        if self.pockets_max == 0 {
            return Err(ConfigError::ValidationError(
                "pockets_max must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the validated config into the dense limit table the engine
    /// caches between dispatches.
    pub fn limits(&self) -> MachineLimits {
        let mut limits = MachineLimits {
            axis_mask: AxisMask::empty(),
            max_velocity: [0.0; AXIS_COUNT],
            max_acceleration: [0.0; AXIS_COUNT],
            max_jerk: [0.0; AXIS_COUNT],
            external_length_units: self.external_length_units,
            external_angle_units: self.external_angle_units,
            tool_change_position: self.tool_change_position,
            pockets_max: self.pockets_max,
        };
        for axis in &self.axes {
            if let Some(flag) = AxisMask::from_axis_number(axis.axis) {
                limits.axis_mask |= flag;
                limits.max_velocity[axis.axis] = axis.max_velocity;
                limits.max_acceleration[axis.axis] = axis.max_acceleration;
                limits.max_jerk[axis.axis] = axis.max_jerk;
            }
        }
        limits
    }
}

/// Dense per-axis limit table, cached on the engine between dispatches and
/// refreshed across canonical init. All limit values are in external units.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineLimits {
    pub axis_mask: AxisMask,
    pub max_velocity: [f64; AXIS_COUNT],
    pub max_acceleration: [f64; AXIS_COUNT],
    pub max_jerk: [f64; AXIS_COUNT],
    pub external_length_units: f64,
    pub external_angle_units: f64,
    pub tool_change_position: Option<Pose>,
    pub pockets_max: usize,
}

impl MachineLimits {
    /// Three linear axes, unit external scales, shared limits. Handy for
    /// tests and simulation hosts.
    pub fn three_axis(max_velocity: f64, max_acceleration: f64, max_jerk: f64) -> Self {
        let mut limits = Self {
            axis_mask: AxisMask::XYZ,
            max_velocity: [0.0; AXIS_COUNT],
            max_acceleration: [0.0; AXIS_COUNT],
            max_jerk: [0.0; AXIS_COUNT],
            external_length_units: 1.0,
            external_angle_units: 1.0,
            tool_change_position: None,
            pockets_max: DEFAULT_POCKETS_MAX,
        };
        for axis in 0..3 {
            limits.max_velocity[axis] = max_velocity;
            limits.max_acceleration[axis] = max_acceleration;
            limits.max_jerk[axis] = max_jerk;
        }
        limits
    }

    /// Extend a mask/limit table with one more axis.
    pub fn with_axis(mut self, axis: usize, vel: f64, acc: f64, jerk: f64) -> Self {
        if let Some(flag) = AxisMask::from_axis_number(axis) {
            self.axis_mask |= flag;
            self.max_velocity[axis] = vel;
            self.max_acceleration[axis] = acc;
            self.max_jerk[axis] = jerk;
        }
        self
    }
}

/// Trait for loading configuration from TOML files.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn three_axis_config() -> MachineConfig {
        MachineConfig {
            axes: (0..3)
                .map(|axis| AxisLimitConfig {
                    axis,
                    max_velocity: 100.0,
                    max_acceleration: 1000.0,
                    max_jerk: 10000.0,
                })
                .collect(),
            external_length_units: 1.0,
            external_angle_units: 1.0,
            tool_change_position: None,
            pockets_max: DEFAULT_POCKETS_MAX,
        }
    }

    #[test]
    fn validation_accepts_sane_config() {
        assert!(three_axis_config().validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_axes() {
        let mut config = three_axis_config();
        config.axes.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_axis_number() {
        let mut config = three_axis_config();
        config.axes[0].axis = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_nonpositive_limits() {
        let mut config = three_axis_config();
        config.axes[1].max_velocity = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn limits_build_mask_from_configured_axes() {
        let limits = three_axis_config().limits();
        assert_eq!(limits.axis_mask, AxisMask::XYZ);
        assert_eq!(limits.max_velocity[0], 100.0);
        assert_eq!(limits.max_velocity[3], 0.0);
        assert!(!limits.axis_mask.has_axis(3));
    }

    #[test]
    fn loads_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"external_length_units = 1.0

[[axes]]
axis = 0
max_velocity = 50.0
max_acceleration = 500.0

[[axes]]
axis = 2
max_velocity = 25.0
max_acceleration = 250.0
max_jerk = 2500.0
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = MachineConfig::load(file.path()).unwrap();
        assert!(config.validate().is_ok());
        let limits = config.limits();
        assert!(limits.axis_mask.has_axis(0));
        assert!(!limits.axis_mask.has_axis(1));
        assert!(limits.axis_mask.has_axis(2));
        // default jerk filled in for axis 0
        assert_eq!(limits.max_jerk[0], 1e4);
        assert_eq!(limits.max_jerk[2], 2500.0);
    }

    #[test]
    fn load_missing_file() {
        let result = MachineConfig::load(Path::new("/nonexistent/helix.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn builder_helpers_extend_mask() {
        let limits = MachineLimits::three_axis(100.0, 1000.0, 10000.0).with_axis(
            5, 360.0, 3600.0, 36000.0,
        );
        assert!(limits.axis_mask.has_axis(5));
        assert_eq!(limits.max_velocity[5], 360.0);
    }
}
