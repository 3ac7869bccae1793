//! Motor configuration.
//!
//! All tuning lives here so a body's behaviour can be swapped by swapping
//! its config. Distances are in meters, angles in degrees.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the motor deals with obstructions it could climb over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepHandling {
    /// Never step. Every obstruction is a wall.
    None,
    /// Step over obstructions up to `max_step_height`.
    #[default]
    Standard,
    /// Like `Standard`, and also accepts steps found by probing
    /// `min_required_step_depth` into the obstruction.
    Extra,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be between 0 and 180 degrees, got {value}")]
    AngleOutOfRange { field: &'static str, value: f32 },

    #[error("{field} must be at least 1")]
    ZeroIterations { field: &'static str },

    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f32),

    #[error("planar constraint axis has no length")]
    DegeneratePlanarAxis,
}

/// Configuration for a kinematic motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorConfig {
    // ========================================================================
    // Grounding
    // ========================================================================
    /// Steepest surface the body can stand on (degrees from up).
    pub max_stable_slope_angle: f32,

    /// Probe for ground at all. When off the body is always airborne.
    pub solve_grounding: bool,

    /// Extra distance added to the ground probe while grounded.
    pub ground_detection_extra_distance: f32,

    // ========================================================================
    // Ledges and denivelation
    // ========================================================================
    /// Detect ledges and sharp changes of slope under the body.
    pub ledge_and_denivelation_handling: bool,

    /// How far past a ledge the body may hang before it loses footing.
    pub max_stable_distance_from_ledge: f32,

    /// Speed toward a ledge above which the body leaves it instead of
    /// snapping down its side. Zero means always leave.
    pub max_velocity_for_ledge_snap: f32,

    /// Largest angle between adjacent ground normals the body can snap across.
    pub max_stable_denivelation_angle: f32,

    // ========================================================================
    // Steps
    // ========================================================================
    pub step_handling: StepHandling,

    /// Tallest obstruction the body can step onto.
    pub max_step_height: f32,

    /// Allow stepping while the ground under the body is not stable.
    pub allow_stepping_without_stable_grounding: bool,

    /// Depth probed into an obstruction by `StepHandling::Extra`.
    pub min_required_step_depth: f32,

    // ========================================================================
    // Movement solving
    // ========================================================================
    /// Sweeps allowed per tick.
    pub max_movement_iterations: u32,

    /// Zero velocity when the sweep budget runs out.
    pub kill_velocity_when_exceed_max_movement_iterations: bool,

    /// Drop the unfinished displacement when the sweep budget runs out.
    pub kill_remaining_movement_when_exceed_max_movement_iterations: bool,

    /// Depenetration sub-steps allowed per tick.
    pub max_decollision_iterations: u32,

    /// Furthest the body may be pushed out of geometry in one tick.
    pub max_depenetration_distance: f32,

    /// Restrict movement to the plane perpendicular to `planar_constraint_axis`.
    pub has_planar_constraint: bool,
    pub planar_constraint_axis: Vec3,

    // ========================================================================
    // Moving bases
    // ========================================================================
    /// Carry the body along with the platform it stands on.
    pub move_with_base: bool,

    /// Keep a platform's velocity when stepping off it.
    pub impart_base_velocity: bool,

    // ========================================================================
    // Root motion
    // ========================================================================
    pub apply_root_motion_during_blend_in: bool,
    pub apply_root_motion_during_blend_out: bool,

    /// Multiplier applied to root-motion translation.
    pub root_motion_translation_scale: f32,

    // ========================================================================
    // Rule-engine inputs
    // ========================================================================
    /// Mass used to turn impulses into velocity changes (kg).
    pub mass: f32,

    /// How long `force_unground` keeps the body off the ground (seconds).
    pub force_unground_time: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            // Grounding
            max_stable_slope_angle: 60.0,
            solve_grounding: true,
            ground_detection_extra_distance: 0.0,

            // Ledges
            ledge_and_denivelation_handling: true,
            max_stable_distance_from_ledge: 0.5,
            max_velocity_for_ledge_snap: 0.0,
            max_stable_denivelation_angle: 180.0,

            // Steps
            step_handling: StepHandling::Standard,
            max_step_height: 0.5,
            allow_stepping_without_stable_grounding: false,
            min_required_step_depth: 0.1,

            // Movement solving
            max_movement_iterations: 5,
            kill_velocity_when_exceed_max_movement_iterations: true,
            kill_remaining_movement_when_exceed_max_movement_iterations: true,
            max_decollision_iterations: 4,
            max_depenetration_distance: 5.0,
            has_planar_constraint: false,
            planar_constraint_axis: Vec3::Z,

            // Moving bases
            move_with_base: true,
            impart_base_velocity: true,

            // Root motion
            apply_root_motion_during_blend_in: true,
            apply_root_motion_during_blend_out: true,
            root_motion_translation_scale: 1.0,

            // Rule-engine inputs
            mass: 1.0,
            force_unground_time: 0.1,
        }
    }
}

impl MotorConfig {
    /// Forgiving setup for platformers: steep slopes, tall steps, sticky ledges.
    pub fn arcade() -> Self {
        Self {
            max_stable_slope_angle: 70.0,
            max_step_height: 0.6,
            step_handling: StepHandling::Extra,
            max_velocity_for_ledge_snap: 2.0, // Runs down small drops instead of launching
            max_stable_distance_from_ledge: 0.6,
            allow_stepping_without_stable_grounding: true,
            ..Default::default()
        }
    }

    /// Strict setup: walkable slopes stay shallow and every ledge is a drop.
    pub fn precise() -> Self {
        Self {
            max_stable_slope_angle: 45.0,
            max_step_height: 0.3,
            max_stable_distance_from_ledge: 0.2,
            max_stable_denivelation_angle: 60.0,
            max_movement_iterations: 8,
            max_decollision_iterations: 8,
            ..Default::default()
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("ground_detection_extra_distance", self.ground_detection_extra_distance),
            ("max_stable_distance_from_ledge", self.max_stable_distance_from_ledge),
            ("max_velocity_for_ledge_snap", self.max_velocity_for_ledge_snap),
            ("max_step_height", self.max_step_height),
            ("min_required_step_depth", self.min_required_step_depth),
            ("max_depenetration_distance", self.max_depenetration_distance),
            ("root_motion_translation_scale", self.root_motion_translation_scale),
            ("force_unground_time", self.force_unground_time),
        ];
        for (field, value) in non_negative {
            // NaN fails this check too
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let angles = [
            ("max_stable_slope_angle", self.max_stable_slope_angle),
            ("max_stable_denivelation_angle", self.max_stable_denivelation_angle),
        ];
        for (field, value) in angles {
            if !(0.0..=180.0).contains(&value) {
                return Err(ConfigError::AngleOutOfRange { field, value });
            }
        }

        if self.max_movement_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                field: "max_movement_iterations",
            });
        }
        if self.max_decollision_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                field: "max_decollision_iterations",
            });
        }

        if !(self.mass > 0.0) {
            return Err(ConfigError::NonPositiveMass(self.mass));
        }

        if self.has_planar_constraint && self.planar_constraint_axis.length_squared() < 1.0e-12 {
            return Err(ConfigError::DegeneratePlanarAxis);
        }

        Ok(())
    }

    /// Height under a hit checked for ground by the ledge casts.
    pub fn ledge_check_height(&self) -> f32 {
        if self.step_handling == StepHandling::None {
            super::MIN_DISTANCE_FOR_LEDGE
        } else {
            self.max_step_height
        }
    }
}
