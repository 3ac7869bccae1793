//! Step-up traversal.
//!
//! Climbs a vertical obstruction no taller than `max_step_height` by
//! sweeping up, forward and back down. The three moves form one operation:
//! if any check fails the body goes back to where it started.

use glam::Vec3;

use crate::collision::{BodyShape, HitResult};

use super::body::ControlledBody;
use super::math::{project_on_plane, with_length};
use super::report::GroundingReport;
use super::stability::is_stable_on_normal;
use super::{
    MotionContext, COLLISION_OFFSET, GROUND_PROBING_REBOUND_DISTANCE, STEPPING_FORWARD_DISTANCE,
    STEP_EDGE_REJECT_DISTANCE,
};

const MIN_PLANAR_DELTA_SQ: f32 = 1.0e-8;

/// A successful step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepUpOutcome {
    /// Height climbed, measured from the floor the body started on.
    pub height: f32,
    /// Down-sweep hit on top of the step. This is the new floor contact.
    pub landing: HitResult,
}

/// Try to climb over `barrier` while moving by `delta`.
///
/// Returns `None` and leaves the body untouched when the step is not
/// climbable.
pub fn step_up(
    ctx: MotionContext<'_>,
    body: &mut ControlledBody,
    delta: Vec3,
    barrier: &HitResult,
    grounding: &GroundingReport,
) -> Option<StepUpOutcome> {
    let config = ctx.config;
    let up = body.up();
    let planar_delta = project_on_plane(delta, up);

    if config.max_step_height <= 0.0 || planar_delta.length_squared() < MIN_PLANAR_DELTA_SQ {
        return None;
    }

    let start = *body;
    let barrier_height = (barrier.impact_point - start.position).dot(up);
    if barrier_height > body.shape.step_ceiling() {
        // The top of the shape is what hit
        return None;
    }

    let (floor_distance, travel_down) = if grounding.is_stable_on_ground {
        (
            grounding.floor_distance,
            config.max_step_height + 2.0 * GROUND_PROBING_REBOUND_DISTANCE,
        )
    } else {
        (0.0, config.max_step_height)
    };
    let travel_up = (config.max_step_height - floor_distance).max(0.0);

    if barrier_height <= -floor_distance {
        return None;
    }

    let revert = |body: &mut ControlledBody| {
        *body = start;
        None
    };

    // Up
    let up_hit = body.move_by(ctx.query, up * travel_up);
    if up_hit.start_penetrating {
        return revert(body);
    }

    // Forward, sliding along anything in the way
    let forward = if planar_delta.length() < STEPPING_FORWARD_DISTANCE {
        with_length(planar_delta, STEPPING_FORWARD_DISTANCE)
    } else {
        planar_delta
    };
    let before_forward = body.position;
    let forward_hit = body.move_by(ctx.query, forward);
    let forward_blocked = forward_hit.blocked;

    if forward_blocked {
        if forward_hit.start_penetrating {
            return revert(body);
        }

        let travelled = (body.position - before_forward).length();
        let left_over = with_length(planar_delta, (planar_delta.length() - travelled).max(0.0));
        let wall = project_on_plane(forward_hit.normal, up).normalize_or_zero();
        let slide = project_on_plane(left_over, wall);
        if slide.length_squared() > MIN_PLANAR_DELTA_SQ {
            body.move_by(ctx.query, slide);
        }

        if (body.position - before_forward).length_squared() < MIN_PLANAR_DELTA_SQ {
            return revert(body);
        }
    }

    // Down
    let down_hit = body.move_by(ctx.query, -up * travel_down);
    if down_hit.start_penetrating || !down_hit.is_valid_blocking_hit() {
        return revert(body);
    }

    let height = (down_hit.impact_point - start.position).dot(up) + floor_distance;
    if height > config.max_step_height {
        return revert(body);
    }
    if !is_stable_on_normal(config, up, down_hit.impact_normal) {
        return revert(body);
    }
    if forward_blocked && height <= COLLISION_OFFSET {
        // Slid along a wall and came back down on the same floor
        return revert(body);
    }

    if let BodyShape::Capsule { radius, .. } = body.shape {
        let from_axis = project_on_plane(down_hit.impact_point - body.position, up).length();
        let reduced_radius = (radius - STEP_EDGE_REJECT_DISTANCE).max(STEP_EDGE_REJECT_DISTANCE);
        if from_axis >= reduced_radius {
            return revert(body);
        }
    }

    log::debug!("stepped up {:.3}m onto {:?}", height, down_hit.object);

    Some(StepUpOutcome {
        height,
        landing: down_hit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionQuery;
    use crate::motor::ground::probe_ground;
    use crate::motor::{test_scenes, MotorConfig};

    /// Ground the body at the origin and walk it into whatever is ahead on +X.
    fn approach(world: &dyn CollisionQuery, config: &MotorConfig) -> (ControlledBody, HitResult, GroundingReport) {
        let ctx = MotionContext::new(world, config);
        let mut body = ControlledBody::new(test_scenes::capsule(), Vec3::new(0.0, 0.2, 0.0));
        let grounding = probe_ground(ctx, &mut body, 0.5, &GroundingReport::default());
        assert!(grounding.is_stable_on_ground, "test body should start grounded");

        let hit = body.move_by(world, Vec3::new(3.0, 0.0, 0.0));
        assert!(hit.is_valid_blocking_hit(), "should reach the obstruction");
        (body, hit, grounding)
    }

    #[test]
    fn test_climbs_step_below_max_height() {
        let world = test_scenes::floor_with_step(0.3);
        let config = MotorConfig::default();
        let (mut body, hit, grounding) = approach(&world, &config);

        // Far enough forward to land fully on top instead of on the edge
        let outcome = step_up(
            MotionContext::new(&world, &config),
            &mut body,
            Vec3::new(0.6, 0.0, 0.0),
            &hit,
            &grounding,
        )
        .expect("0.3m step is climbable");

        assert!((outcome.height - 0.3).abs() < 0.01, "height={}", outcome.height);
        assert!(
            (body.position.y - (0.3 + COLLISION_OFFSET)).abs() < 0.01,
            "Should rest on the step, got y={}",
            body.position.y
        );
        assert!((outcome.landing.impact_normal - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_rejects_step_above_max_height() {
        let world = test_scenes::floor_with_step(0.7);
        let config = MotorConfig::default();
        let (mut body, hit, grounding) = approach(&world, &config);
        let before = body;

        let outcome = step_up(
            MotionContext::new(&world, &config),
            &mut body,
            Vec3::new(0.1, 0.0, 0.0),
            &hit,
            &grounding,
        );

        assert!(outcome.is_none());
        assert_eq!(body, before, "failed step must revert");
    }

    #[test]
    fn test_wall_is_not_climbed() {
        let world = test_scenes::floor_with_wall();
        let config = MotorConfig::default();
        let (mut body, hit, grounding) = approach(&world, &config);
        let before = body;

        // Diagonal push: the forward sweep slides along the wall and lands on the same floor
        let outcome = step_up(
            MotionContext::new(&world, &config),
            &mut body,
            Vec3::new(0.08, 0.0, 0.03),
            &hit,
            &grounding,
        );

        assert!(outcome.is_none());
        assert_eq!(body, before);
    }

    #[test]
    fn test_zero_step_height_disables_stepping() {
        let world = test_scenes::floor_with_step(0.1);
        let config = MotorConfig {
            max_step_height: 0.0,
            ..Default::default()
        };
        let (mut body, hit, grounding) = approach(&world, &config);

        let outcome = step_up(
            MotionContext::new(&world, &config),
            &mut body,
            Vec3::new(0.1, 0.0, 0.0),
            &hit,
            &grounding,
        );
        assert!(outcome.is_none());
    }

    #[test]
    fn test_unstable_landing_is_rejected() {
        let mut world = test_scenes::flat_floor();
        // A 0.3m riser topped by a 70 degree slope
        world.add_box(
            Vec3::new(2.5, 0.15, 0.0),
            Vec3::new(0.5, 0.15, 10.0),
            crate::collision::ContentFlags::SOLID,
        );
        let rotation = glam::Quat::from_rotation_z(70f32.to_radians());
        world.add_oriented_box(
            Vec3::new(2.0, 0.3, 0.0) + rotation * Vec3::new(5.0, -0.5, 0.0),
            Vec3::new(5.0, 0.5, 10.0),
            rotation,
            crate::collision::ContentFlags::SOLID,
        );
        let config = MotorConfig::default();
        let (mut body, hit, grounding) = approach(&world, &config);
        let before = body;

        let outcome = step_up(
            MotionContext::new(&world, &config),
            &mut body,
            Vec3::new(0.1, 0.0, 0.0),
            &hit,
            &grounding,
        );

        assert!(outcome.is_none());
        assert_eq!(body, before);
    }
}
