//! The motor: one body, one config, one tick at a time.

use glam::{Quat, Vec3};

use crate::collision::{BodyShape, CollisionQuery};

use super::base::BaseTracker;
use super::body::ControlledBody;
use super::config::{ConfigError, MotorConfig};
use super::ground::{probe_ground, probing_distance};
use super::math::{direction_tangent_to_surface, project_on_plane};
use super::penetration::{resolve, Depenetration};
use super::report::{GroundingReport, GroundingStatus, MotorEvent, TickReport};
use super::root_motion::{self, RootMotionSample};
use super::state::MotorState;
use super::sweep::integrate;
use super::{MotionContext, MINIMUM_GROUND_PROBING_DISTANCE, MIN_DELTA_TIME};

/// Kinematic character motor.
///
/// Owns a [`ControlledBody`] and moves it through whatever
/// [`CollisionQuery`] it is handed each tick. Gameplay code drives it by
/// setting velocity, applying impulses and forcing it off the ground;
/// the motor reports back through the [`TickReport`] returned by
/// [`update`](Self::update).
///
/// # Example
///
/// ```ignore
/// let mut motor = KinematicMotor::new(BodyShape::HUMANOID, MotorConfig::default())?;
/// motor.spawn_at(&world, spawn_position);
///
/// // Each tick:
/// motor.set_velocity(desired_velocity);
/// let report = motor.update(&world, delta_time);
/// ```
#[derive(Debug, Clone)]
pub struct KinematicMotor {
    config: MotorConfig,
    body: ControlledBody,
    grounding: GroundingReport,
    last_grounding: GroundingReport,
    must_unground: bool,
    must_unground_time: f32,
    last_movement_iteration_found_any_ground: bool,
    base: BaseTracker,
    stuck_in_geometry: bool,
    root_motion: Option<RootMotionSample>,
    events: Vec<MotorEvent>,
}

impl KinematicMotor {
    /// Create a motor for `shape` at the origin.
    pub fn new(shape: BodyShape, config: MotorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(shape, config))
    }

    /// Create a motor with the default configuration.
    pub fn with_default_config(shape: BodyShape) -> Self {
        Self::build(shape, MotorConfig::default())
    }

    fn build(shape: BodyShape, config: MotorConfig) -> Self {
        Self {
            config,
            body: ControlledBody::new(shape, Vec3::ZERO),
            grounding: GroundingReport::default(),
            last_grounding: GroundingReport::default(),
            must_unground: false,
            must_unground_time: 0.0,
            last_movement_iteration_found_any_ground: false,
            base: BaseTracker::default(),
            stuck_in_geometry: false,
            root_motion: None,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: MotorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn body(&self) -> &ControlledBody {
        &self.body
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn rotation(&self) -> Quat {
        self.body.rotation
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    /// Ground found by the latest tick.
    pub fn grounding(&self) -> &GroundingReport {
        &self.grounding
    }

    /// Moving base the body is riding.
    pub fn base(&self) -> &BaseTracker {
        &self.base
    }

    pub fn stuck_in_geometry(&self) -> bool {
        self.stuck_in_geometry
    }

    /// Whether ground snapping is currently suspended.
    pub fn must_unground(&self) -> bool {
        self.must_unground || self.must_unground_time > 0.0
    }

    pub fn status(&self) -> GroundingStatus {
        if self.stuck_in_geometry || !self.config.solve_grounding {
            GroundingStatus::None
        } else if self.grounding.is_stable_on_ground {
            GroundingStatus::Grounded
        } else {
            GroundingStatus::Airborne
        }
    }

    // ========================================================================
    // Gameplay inputs
    // ========================================================================

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.body.velocity = velocity;
    }

    /// Add an impulse. With `velocity_change` the vector is a raw velocity
    /// change; otherwise it is divided by the body's mass.
    pub fn apply_impulse(&mut self, impulse: Vec3, velocity_change: bool) {
        if velocity_change {
            self.body.velocity += impulse;
        } else {
            self.body.velocity += impulse / self.config.mass;
        }
    }

    /// Stop snapping to the ground for the configured time, e.g. for a jump.
    pub fn force_unground(&mut self) {
        self.force_unground_for(self.config.force_unground_time);
    }

    /// Stop snapping to the ground for `seconds`.
    pub fn force_unground_for(&mut self, seconds: f32) {
        self.must_unground = true;
        self.must_unground_time = seconds.max(0.0);
    }

    /// Teleport without a collision check.
    pub fn set_position(&mut self, position: Vec3) {
        self.body.position = position;
    }

    /// Set the orientation without a collision check.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.body.rotation = rotation.normalize();
    }

    /// Drive the next tick from an animation sample.
    pub fn set_root_motion(&mut self, sample: RootMotionSample) {
        self.root_motion = Some(sample);
    }

    /// Place the body at `position` and snap it to the floor below, if any.
    pub fn spawn_at(&mut self, query: &dyn CollisionQuery, position: Vec3) -> GroundingStatus {
        self.body.position = position;
        self.must_unground = false;
        self.must_unground_time = 0.0;
        self.stuck_in_geometry = false;
        self.root_motion = None;
        self.base = BaseTracker::default();

        let ctx = MotionContext::new(query, &self.config);
        let up = self.body.up();
        let distance = self.body.shape.height();
        self.last_grounding = GroundingReport::ungrounded(up);
        self.grounding = probe_ground(ctx, &mut self.body, distance, &self.last_grounding);
        self.last_movement_iteration_found_any_ground = false;
        self.base.refresh(query, &mut self.body, &self.grounding, false);

        log::debug!(
            "spawned at {:?}, grounded: {}",
            self.body.position,
            self.grounding.is_stable_on_ground
        );
        self.status()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn capture_state(&self) -> MotorState {
        MotorState {
            position: self.body.position,
            rotation: self.body.rotation,
            velocity: self.body.velocity,
            must_unground: self.must_unground,
            must_unground_time: self.must_unground_time,
            last_movement_iteration_found_any_ground: self.last_movement_iteration_found_any_ground,
            grounding: self.grounding,
            last_grounding: self.last_grounding,
            base: self.base,
            stuck_in_geometry: self.stuck_in_geometry,
        }
    }

    /// Restore a captured state. Pending root motion and events are dropped.
    pub fn apply_state(&mut self, state: &MotorState) {
        self.body.position = state.position;
        self.body.rotation = state.rotation;
        self.body.velocity = state.velocity;
        self.must_unground = state.must_unground;
        self.must_unground_time = state.must_unground_time;
        self.last_movement_iteration_found_any_ground = state.last_movement_iteration_found_any_ground;
        self.grounding = state.grounding;
        self.last_grounding = state.last_grounding;
        self.base = state.base;
        self.stuck_in_geometry = state.stuck_in_geometry;
        self.root_motion = None;
        self.events.clear();
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the body by one tick.
    ///
    /// Never fails: a body stuck in geometry is reported through the
    /// returned status instead.
    pub fn update(&mut self, query: &dyn CollisionQuery, delta_time: f32) -> TickReport {
        if !(delta_time >= MIN_DELTA_TIME) {
            return self.report();
        }

        if !self.pre_update(query, delta_time) {
            return self.report();
        }

        let ctx = MotionContext::new(query, &self.config);
        let must_unground = self.must_unground || self.must_unground_time > 0.0;
        self.last_movement_iteration_found_any_ground = integrate(
            ctx,
            &mut self.body,
            &mut self.grounding,
            must_unground,
            delta_time,
            &mut self.events,
        );

        self.post_update();
        self.report()
    }

    /// Everything before integration. Returns false when movement is
    /// suspended this tick.
    fn pre_update(&mut self, query: &dyn CollisionQuery, delta_time: f32) -> bool {
        let ctx = MotionContext::new(query, &self.config);

        // Penetration
        let outcome = resolve(ctx, &mut self.body);
        if self.stuck_in_geometry {
            if outcome == Depenetration::Stuck {
                return false;
            }
            log::debug!("freed from geometry at {:?}", self.body.position);
            self.stuck_in_geometry = false;
            self.events.push(MotorEvent::FreedFromGeometry {
                position: self.body.position,
            });
        } else if outcome == Depenetration::Stuck {
            log::debug!("stuck in geometry at {:?}", self.body.position);
            self.stuck_in_geometry = true;
            self.events.push(MotorEvent::StuckInGeometry {
                position: self.body.position,
            });
            return false;
        }

        // Root motion
        if let Some(sample) = self.root_motion.take() {
            root_motion::apply(ctx, &mut self.body, &sample, self.grounding.is_stable_on_ground, delta_time);
        }

        // Moving base
        if self.config.move_with_base {
            self.base.follow(query, &mut self.body, delta_time);
        }

        // Ground
        let up = self.body.up();
        self.last_grounding = self.grounding;
        self.grounding = GroundingReport::ungrounded(up);

        if self.config.solve_grounding {
            if self.must_unground || self.must_unground_time > 0.0 {
                self.body
                    .teleport_by(up * (MINIMUM_GROUND_PROBING_DISTANCE * 1.5));
            } else {
                let distance = probing_distance(
                    &self.config,
                    &self.body.shape,
                    &self.last_grounding,
                    self.last_movement_iteration_found_any_ground,
                );
                self.grounding = probe_ground(ctx, &mut self.body, distance, &self.last_grounding);
            }
        }

        let was_stable = self.last_grounding.is_stable_on_ground;
        let is_stable = self.grounding.is_stable_on_ground;
        if !was_stable && is_stable {
            // Keep horizontal speed, follow the new ground
            let flat = project_on_plane(self.body.velocity, up);
            self.body.velocity =
                direction_tangent_to_surface(flat, self.grounding.ground_normal, up) * flat.length();
            self.events.push(MotorEvent::Landed {
                point: self.grounding.ground_point,
                normal: self.grounding.ground_normal,
            });
        } else if was_stable && !is_stable {
            self.events.push(MotorEvent::LeftGround);
        }

        if let Some(event) = self.base.refresh(
            query,
            &mut self.body,
            &self.grounding,
            self.config.impart_base_velocity,
        ) {
            self.events.push(event);
        }

        self.must_unground = false;
        self.must_unground_time = (self.must_unground_time - delta_time).max(0.0);
        self.last_movement_iteration_found_any_ground = false;

        true
    }

    fn post_update(&mut self) {
        if self.config.has_planar_constraint {
            self.body.velocity = project_on_plane(self.body.velocity, self.config.planar_constraint_axis);
        }
    }

    /// Build the tick report and drain pending events.
    fn report(&mut self) -> TickReport {
        let grounded = self.grounding.is_stable_on_ground && !self.stuck_in_geometry;
        TickReport {
            status: self.status(),
            position: self.body.position,
            rotation: self.body.rotation,
            velocity: self.body.velocity,
            floor_normal: grounded.then_some(self.grounding.ground_normal),
            floor_point: grounded.then_some(self.grounding.ground_point),
            stuck_in_geometry: self.stuck_in_geometry,
            events: std::mem::take(&mut self.events),
        }
    }
}
