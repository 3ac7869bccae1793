//! Kinematic character motor.
//!
//! Moves a [`ControlledBody`] through a scene one tick at a time using only
//! collision queries. There is no rigid-body simulation: the motor sweeps the
//! body's shape, slides along what it hits, snaps to the floor, climbs steps
//! and rides moving platforms.
//!
//! # Architecture
//!
//! Each tick runs the same pipeline inside [`KinematicMotor::update`]:
//!
//! 1. **Penetration**: push the body out of anything it ended up inside
//! 2. **Root motion**: optionally override velocity from an animation sample
//! 3. **Moving base**: carry the body along with the platform it stands on
//! 4. **Ground probe**: find the floor and snap to it
//! 5. **Sweep and slide**: move along the velocity, projecting on every hit
//! 6. **Post update**: planar constraint, status, events
//!
//! The phases live in their own modules and share a [`MotionContext`]: the
//! collision query service for this tick plus the motor's configuration.

mod base;
mod body;
mod config;
mod ground;
pub mod math;
#[allow(clippy::module_inception)]
mod motor;
mod penetration;
mod report;
mod root_motion;
mod stability;
mod state;
mod step;
mod sweep;

pub use base::BaseTracker;
pub use body::ControlledBody;
pub use config::{ConfigError, MotorConfig, StepHandling};
pub use motor::KinematicMotor;
pub use penetration::Depenetration;
pub use report::{
    GroundingReport, GroundingStatus, HitStabilityReport, LedgeReport, MotorEvent, StepCandidate,
    TickReport,
};
pub use root_motion::RootMotionSample;
pub use state::{CodecError, MotorState};

use crate::collision::CollisionQuery;

// ============================================================================
// Tuning constants (meters, seconds)
// ============================================================================

/// Clearance the body keeps from every surface it touches.
pub const COLLISION_OFFSET: f32 = 0.01;

/// Bodies already this close to their snapped height are left where they are.
pub const GROUND_SNAP_TOLERANCE: f32 = 1.0e-4;

/// Distance a ground probe may keep sliding after hitting an unstable surface.
pub const GROUND_PROBING_REBOUND_DISTANCE: f32 = 0.02;

/// Shortest ground probe the motor ever runs.
pub const MINIMUM_GROUND_PROBING_DISTANCE: f32 = 0.005;

/// How far ground probes start behind the body.
pub const GROUND_PROBING_BACKSTEP_DISTANCE: f32 = 0.1;

/// How far movement sweeps start behind the body.
pub const SWEEP_PROBING_BACKSTEP_DISTANCE: f32 = 0.002;

/// Height above a hit point where ledge line casts start.
pub const SECONDARY_PROBES_VERTICAL: f32 = 0.02;

/// Sideways offset of the two ledge line casts from the hit point.
pub const SECONDARY_PROBES_HORIZONTAL: f32 = 0.001;

/// Depth below a hit at which a missing floor counts as a ledge.
pub const MIN_DISTANCE_FOR_LEDGE: f32 = 0.05;

/// Largest `|normal . up|` for which a hit counts as a vertical wall.
pub const CORRELATION_FOR_VERTICAL_OBSTRUCTION: f32 = 0.01;

/// Minimum forward distance of a step-up attempt.
pub const STEPPING_FORWARD_DISTANCE: f32 = 0.03;

/// Ground probe sweeps allowed per tick.
pub const MAX_GROUND_SWEEP_ITERATIONS: u32 = 2;

/// Length of the axis sweeps used to detect penetration.
pub const PENETRATION_TEST_DISTANCE: f32 = 0.01;

/// Root-motion translation components below this are treated as zero.
pub const ROOT_MOTION_VELOCITY_TOLERANCE: f32 = 0.01;

/// Ticks shorter than this are ignored.
pub const MIN_DELTA_TIME: f32 = 1.0e-6;

/// Step landings this close to the rim of a capsule's bottom are rejected.
pub const STEP_EDGE_REJECT_DISTANCE: f32 = 0.0015;

/// Shared inputs for every motor phase during one tick.
#[derive(Clone, Copy)]
pub struct MotionContext<'a> {
    /// Collision query service for this tick.
    pub query: &'a dyn CollisionQuery,
    /// Motor configuration.
    pub config: &'a MotorConfig,
}

impl<'a> MotionContext<'a> {
    pub fn new(query: &'a dyn CollisionQuery, config: &'a MotorConfig) -> Self {
        Self { query, config }
    }
}
