//! Sweep-and-slide integration.
//!
//! Moves the body along its velocity for one tick. Each sweep either
//! reaches the end of the remaining distance or hits something; on a hit
//! the body advances to the contact, may step up, and otherwise has its
//! velocity projected along the surface before the next sweep.
//!
//! Two consecutive unstable hits that form a crease (a V between two walls)
//! are handled by a small state machine: airborne bodies slide along the
//! crease line, grounded bodies stop.

use glam::Vec3;

use crate::collision::HitResult;

use super::body::ControlledBody;
use super::config::StepHandling;
use super::math::{direction_tangent_to_surface, project_on_normal, project_on_plane};
use super::report::{GroundingReport, MotorEvent};
use super::stability::{evaluate_hit_stability, is_stable_on_normal};
use super::step::step_up;
use super::{MotionContext, COLLISION_OFFSET, CORRELATION_FOR_VERTICAL_OBSTRUCTION, SWEEP_PROBING_BACKSTEP_DISTANCE};

/// Position of the integrator in the crease state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepState {
    Initial,
    AfterFirstHit,
    FoundBlockingCrease,
    FoundBlockingCorner,
}

/// The last unstable hit the velocity was projected on.
#[derive(Debug, Clone, Copy)]
struct PreviousHit {
    obstruction_normal: Vec3,
    velocity: Vec3,
}

/// Velocity projection across the sweeps of one tick.
struct VelocityProjector {
    state: SweepState,
    previous: Option<PreviousHit>,
    up: Vec3,
    grounded: bool,
    ground_normal: Vec3,
    planar_axis: Option<Vec3>,
    found_any_ground: bool,
}

impl VelocityProjector {
    /// Project `velocity` for a hit and rescale the remaining distance to match.
    fn project(
        &mut self,
        stable_on_hit: bool,
        obstruction_normal: Vec3,
        velocity: &mut Vec3,
        remaining_distance: &mut f32,
        remaining_direction: &mut Vec3,
    ) {
        if velocity.length_squared() <= 0.0 {
            return;
        }
        let incoming = *velocity;

        if stable_on_hit {
            self.found_any_ground = true;
            *velocity = self.slide(*velocity, obstruction_normal, true);
        } else {
            match self.state {
                SweepState::Initial => {
                    *velocity = self.slide(*velocity, obstruction_normal, false);
                    self.state = SweepState::AfterFirstHit;
                }
                SweepState::AfterFirstHit => {
                    let crease = self.previous.and_then(|previous| {
                        evaluate_crease(
                            *velocity,
                            previous.velocity,
                            obstruction_normal,
                            previous.obstruction_normal,
                        )
                    });
                    match crease {
                        Some(_) if self.grounded => {
                            *velocity = Vec3::ZERO;
                            self.state = SweepState::FoundBlockingCorner;
                        }
                        Some(direction) => {
                            *velocity = project_on_normal(*velocity, direction);
                            self.state = SweepState::FoundBlockingCrease;
                        }
                        None => {
                            *velocity = self.slide(*velocity, obstruction_normal, false);
                        }
                    }
                }
                SweepState::FoundBlockingCrease => {
                    *velocity = Vec3::ZERO;
                    self.state = SweepState::FoundBlockingCorner;
                }
                SweepState::FoundBlockingCorner => {}
            }

            self.previous = Some(PreviousHit {
                obstruction_normal,
                velocity: incoming,
            });
        }

        if let Some(axis) = self.planar_axis {
            *velocity = project_on_plane(*velocity, axis);
        }

        let factor = velocity.length() / incoming.length();
        *remaining_distance *= factor;
        *remaining_direction = velocity.normalize_or_zero();
    }

    /// Redirect velocity along a single surface.
    fn slide(&self, velocity: Vec3, obstruction_normal: Vec3, stable_on_hit: bool) -> Vec3 {
        let speed = velocity.length();

        if stable_on_hit {
            // Landing from the air keeps only the horizontal speed
            let speed = if self.grounded {
                speed
            } else {
                project_on_plane(velocity, self.up).length()
            };
            return direction_tangent_to_surface(velocity, obstruction_normal, self.up) * speed;
        }

        if self.grounded {
            // Keep sliding along the floor instead of climbing the obstruction
            let right = obstruction_normal.cross(self.ground_normal).normalize_or_zero();
            let up_along_obstruction = right.cross(obstruction_normal).normalize_or_zero();
            let along_ground = direction_tangent_to_surface(velocity, up_along_obstruction, self.up) * speed;
            return project_on_plane(along_ground, obstruction_normal);
        }

        project_on_plane(velocity, obstruction_normal)
    }
}

/// Direction of the crease formed by two blocking surfaces, if the body is
/// being pushed into it.
///
/// The returned direction points along the current velocity.
fn evaluate_crease(
    velocity: Vec3,
    previous_velocity: Vec3,
    normal: Vec3,
    previous_normal: Vec3,
) -> Option<Vec3> {
    if normal.dot(previous_normal) >= 0.999 {
        return None;
    }

    let crease = normal.cross(previous_normal).normalize_or_zero();
    let a = project_on_plane(normal, crease).normalize_or_zero();
    let b = project_on_plane(previous_normal, crease).normalize_or_zero();
    let dot_planes = a.dot(b);
    let entering = -project_on_plane(previous_velocity, crease).normalize_or_zero();

    if dot_planes <= entering.dot(a) + 0.001 && dot_planes <= entering.dot(b) + 0.01 {
        if crease.dot(velocity) < 0.0 {
            return Some(-crease);
        }
        return Some(crease);
    }

    None
}

/// Normal used to project velocity for a hit.
///
/// Grounded bodies treat unstable obstructions as vertical walls so the
/// projection never pushes them up or into the floor.
fn obstruction_normal(grounding: &GroundingReport, grounded: bool, up: Vec3, hit_normal: Vec3, stable_on_hit: bool) -> Vec3 {
    if grounded && !stable_on_hit {
        let left = grounding.ground_normal.cross(hit_normal).normalize_or_zero();
        let normal = left.cross(up).normalize_or_zero();
        if normal != Vec3::ZERO {
            return normal;
        }
    }
    hit_normal
}

/// Move the body along its velocity for `delta_time`.
///
/// Updates the body's position and velocity in place. A successful step-up
/// rewrites `grounding` to the new floor. Returns whether any sweep landed
/// on stable ground.
pub fn integrate(
    ctx: MotionContext<'_>,
    body: &mut ControlledBody,
    grounding: &mut GroundingReport,
    must_unground: bool,
    delta_time: f32,
    events: &mut Vec<MotorEvent>,
) -> bool {
    let config = ctx.config;
    let up = body.up();
    let grounded = grounding.is_stable_on_ground && !must_unground;

    let mut velocity = body.velocity;
    let mut remaining_distance = velocity.length() * delta_time;
    let mut remaining_direction = velocity.normalize_or_zero();
    if remaining_distance <= 0.0 || remaining_direction == Vec3::ZERO {
        return false;
    }

    let mut projector = VelocityProjector {
        state: SweepState::Initial,
        previous: None,
        up,
        grounded,
        ground_normal: grounding.ground_normal,
        planar_axis: config.has_planar_constraint.then_some(config.planar_constraint_axis),
        found_any_ground: false,
    };

    let mut sweeps = 0;
    let mut hit_something = true;

    while remaining_distance > 0.0 && sweeps < config.max_movement_iterations && hit_something {
        let hit = body.sweep_backstepped(
            ctx.query,
            body.position,
            remaining_direction,
            remaining_distance + COLLISION_OFFSET,
            SWEEP_PROBING_BACKSTEP_DISTANCE,
        );

        if hit.start_penetrating {
            // Push out first so the next sweep does not start inside again
            let normal = match ctx.query.penetration(&body.shape, body.position, body.rotation) {
                Some(penetration) => {
                    body.teleport_by(penetration.direction * (penetration.depth + COLLISION_OFFSET));
                    penetration.direction
                }
                None => hit.normal,
            };
            let stable_on_hit = is_stable_on_normal(config, up, normal) && !must_unground;
            let obstruction = obstruction_normal(grounding, grounded, up, normal, stable_on_hit);
            let mut detached = VelocityProjector {
                state: SweepState::Initial,
                previous: None,
                ..projector
            };
            detached.project(
                stable_on_hit,
                obstruction,
                &mut velocity,
                &mut remaining_distance,
                &mut remaining_direction,
            );
            projector.found_any_ground |= detached.found_any_ground;
        } else if hit.is_valid_blocking_hit() {
            let advance = (hit.distance - COLLISION_OFFSET).max(0.0);
            body.position += remaining_direction * advance;
            remaining_distance = (remaining_distance - advance).max(0.0);

            let stability = evaluate_hit_stability(ctx, body, body.position, &hit, velocity);

            let mut stepped = false;
            if grounded
                && config.step_handling != StepHandling::None
                && hit.impact_normal.dot(up).abs() <= CORRELATION_FOR_VERTICAL_OBSTRUCTION
            {
                let delta = remaining_direction * remaining_distance;
                if let Some(covered) = try_step(ctx, body, grounding, &hit, delta, events) {
                    remaining_distance = (remaining_distance - covered).max(0.0);
                    stepped = true;
                }
            }

            if !stepped {
                let stable_on_hit = stability.is_stable && stability.step.is_none() && !must_unground;
                let obstruction = obstruction_normal(grounding, grounded, up, hit.normal, stable_on_hit);

                events.push(MotorEvent::MovementHit {
                    point: hit.impact_point,
                    normal: hit.impact_normal,
                    object: hit.object,
                    stable: stable_on_hit,
                });

                projector.project(
                    stable_on_hit,
                    obstruction,
                    &mut velocity,
                    &mut remaining_distance,
                    &mut remaining_direction,
                );
            }
        } else {
            hit_something = false;
        }

        sweeps += 1;
    }

    if hit_something && remaining_distance > 0.0 && sweeps >= config.max_movement_iterations {
        log::debug!(
            "movement iterations exceeded with {:.4}m left at {:?}",
            remaining_distance,
            body.position
        );
        events.push(MotorEvent::MovementIterationsExceeded { remaining_distance });

        if config.kill_remaining_movement_when_exceed_max_movement_iterations {
            remaining_distance = 0.0;
        }
        if config.kill_velocity_when_exceed_max_movement_iterations {
            velocity = Vec3::ZERO;
        }
    }

    body.position += remaining_direction * remaining_distance;
    body.velocity = velocity;
    projector.found_any_ground
}

/// Attempt a step-up and, on success, record the new floor.
///
/// Returns the planar distance the step covered.
fn try_step(
    ctx: MotionContext<'_>,
    body: &mut ControlledBody,
    grounding: &mut GroundingReport,
    barrier: &HitResult,
    delta: Vec3,
    events: &mut Vec<MotorEvent>,
) -> Option<f32> {
    let up = body.up();
    let before = body.position;
    let outcome = step_up(ctx, body, delta, barrier, grounding)?;
    let landing = outcome.landing;

    grounding.found_any_ground = true;
    grounding.is_stable_on_ground = true;
    grounding.snapping_prevented = false;
    grounding.ground_normal = landing.impact_normal;
    grounding.ground_point = landing.impact_point;
    grounding.ground_object = landing.object;
    grounding.floor_distance = (body.position - landing.impact_point).dot(up).max(0.0);
    grounding.hit = Some(landing);

    events.push(MotorEvent::SteppedUp {
        height: outcome.height,
        object: landing.object,
    });

    Some(project_on_plane(body.position - before, up).length())
}
