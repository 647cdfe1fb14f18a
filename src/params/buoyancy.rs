//! Buoyant body parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for the plane-fit approximation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneFitSettings {
    /// Ticks between plane re-fits
    pub refit_interval_ticks: u32,

    /// Power-iteration steps per principal axis (20 is plenty for 3x3)
    pub iterations: u32,

    /// Number of recent fits the target is smoothed over
    pub smoothing_window: usize,

    /// Natural frequency of the critically damped follow spring (radians per second)
    pub spring_frequency: f32,

    /// Rest height of the body origin above the fitted plane (meters, negative = draft)
    pub height_offset_m: f32,
}

impl Default for PlaneFitSettings {
    fn default() -> Self {
        Self {
            refit_interval_ticks: 4,
            iterations: 24,
            smoothing_window: 10,
            spring_frequency: 4.0,
            height_offset_m: 0.0,
        }
    }
}

/// Force integration policy, selectable per body
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForcePolicy {
    /// Per-voxel buoyant forces applied to a dynamic rigid body
    #[default]
    Direct,
    /// Kinematic follow of a least-squares plane through the sampled heights
    PlaneFit(PlaneFitSettings),
}

/// Buoyant body configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyConfig {
    pub policy: ForcePolicy,

    /// Body density relative to water (1.0 = neutrally buoyant)
    pub density: f32,

    /// Voxel edge as a fraction of the body's smallest bounding extent, in (0, 1]
    pub normalized_voxel_size: f32,

    /// Linear drag when dry; rises to 1.0 when fully submerged
    pub min_linear_drag: f32,

    /// Angular drag when dry; rises to 1.0 when fully submerged
    pub min_angular_drag: f32,

    /// Resolved samples kept per receiver voxel
    pub history_capacity: usize,
}

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self {
            policy: ForcePolicy::Direct,
            density: 0.5,
            normalized_voxel_size: 0.5,
            min_linear_drag: 0.05,
            min_angular_drag: 0.05,
            history_capacity: 8,
        }
    }
}

impl BuoyancyConfig {
    /// Reject values the integrator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(ConfigError::InvalidDensity(self.density));
        }
        if !(self.normalized_voxel_size > 0.0 && self.normalized_voxel_size <= 1.0) {
            return Err(ConfigError::InvalidVoxelSize(self.normalized_voxel_size));
        }
        for (what, value) in [
            ("min linear drag", self.min_linear_drag),
            ("min angular drag", self.min_angular_drag),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { what, value });
            }
        }
        if self.history_capacity < 2 {
            return Err(ConfigError::HistoryTooShort(self.history_capacity));
        }
        if let ForcePolicy::PlaneFit(settings) = &self.policy {
            if settings.refit_interval_ticks == 0 || settings.iterations == 0 {
                return Err(ConfigError::NonPositive {
                    what: "plane fit interval and iterations",
                    value: 0.0,
                });
            }
            if settings.smoothing_window == 0 {
                return Err(ConfigError::NonPositive {
                    what: "plane fit smoothing window",
                    value: 0.0,
                });
            }
            if !(settings.spring_frequency.is_finite() && settings.spring_frequency > 0.0) {
                return Err(ConfigError::NonPositive {
                    what: "plane fit spring frequency",
                    value: settings.spring_frequency,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buoyancy_config_is_valid() {
        assert!(BuoyancyConfig::default().validate().is_ok());
        let plane = BuoyancyConfig {
            policy: ForcePolicy::PlaneFit(PlaneFitSettings::default()),
            ..BuoyancyConfig::default()
        };
        assert!(plane.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_density_and_oversized_voxels() {
        let zero_density = BuoyancyConfig {
            density: 0.0,
            ..BuoyancyConfig::default()
        };
        assert_eq!(zero_density.validate(), Err(ConfigError::InvalidDensity(0.0)));

        let huge_voxels = BuoyancyConfig {
            normalized_voxel_size: 1.5,
            ..BuoyancyConfig::default()
        };
        assert_eq!(huge_voxels.validate(), Err(ConfigError::InvalidVoxelSize(1.5)));
    }
}
