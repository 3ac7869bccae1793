//! Ground probing and snapping.
//!
//! Every tick the motor sweeps its shape down to find the floor. A stable
//! hit snaps the body so it floats exactly `COLLISION_OFFSET` above the
//! ground. An unstable hit (steep slope, wall) lets the probe slide a little
//! further along the surface before giving up.

use crate::collision::BodyShape;

use super::body::ControlledBody;
use super::config::{MotorConfig, StepHandling};
use super::math::project_on_plane;
use super::report::GroundingReport;
use super::stability::{evaluate_hit_stability, is_stable_with_special_cases};
use super::{
    MotionContext, COLLISION_OFFSET, GROUND_PROBING_BACKSTEP_DISTANCE, GROUND_PROBING_REBOUND_DISTANCE,
    GROUND_SNAP_TOLERANCE, MAX_GROUND_SWEEP_ITERATIONS, MINIMUM_GROUND_PROBING_DISTANCE,
};

/// How far down to probe this tick.
///
/// A body that stood on ground last tick probes far enough to follow the
/// floor down steps and slopes; anything else only checks right under
/// itself so a jump is not snapped back down.
pub fn probing_distance(
    config: &MotorConfig,
    shape: &BodyShape,
    last_grounding: &GroundingReport,
    last_iteration_found_ground: bool,
) -> f32 {
    if last_grounding.snapping_prevented
        || !(last_grounding.is_stable_on_ground || last_iteration_found_ground)
    {
        return MINIMUM_GROUND_PROBING_DISTANCE;
    }

    let reach = if config.step_handling == StepHandling::None {
        shape.radius()
    } else {
        shape.radius().max(config.max_step_height)
    };
    reach + config.ground_detection_extra_distance
}

/// Probe for ground under the body and snap to it.
///
/// The body only moves when a stable, snappable floor is found.
pub fn probe_ground(
    ctx: MotionContext<'_>,
    body: &mut ControlledBody,
    probing_distance: f32,
    last_grounding: &GroundingReport,
) -> GroundingReport {
    let up = body.up();
    let mut report = GroundingReport::ungrounded(up);

    let mut sweep_position = body.position;
    let mut direction = -up;
    let mut remaining = probing_distance.max(MINIMUM_GROUND_PROBING_DISTANCE);
    let mut sweeps = 0;

    while remaining > 0.0 && sweeps <= MAX_GROUND_SWEEP_ITERATIONS {
        let hit = body.sweep_backstepped(
            ctx.query,
            sweep_position,
            direction,
            remaining,
            GROUND_PROBING_BACKSTEP_DISTANCE,
        );
        if !hit.is_valid_blocking_hit() {
            break;
        }

        let at_position = sweep_position + direction * hit.distance;
        let stability = evaluate_hit_stability(ctx, body, at_position, &hit, body.velocity);

        report.found_any_ground = true;
        report.ground_normal = hit.impact_normal;
        report.inner_ground_normal = stability.inner_normal;
        report.outer_ground_normal = stability.outer_normal;
        report.ground_point = hit.impact_point;
        report.ground_object = hit.object;
        report.hit = Some(hit);
        report.snapping_prevented = false;

        if stability.is_stable {
            report.snapping_prevented =
                !is_stable_with_special_cases(ctx.config, &stability, body.velocity, last_grounding);
            report.is_stable_on_ground = !report.snapping_prevented;

            if report.snapping_prevented {
                log::trace!("snapping prevented at {:?}", hit.impact_point);
            } else {
                let snap = hit.distance - COLLISION_OFFSET;
                // A body resting at its clearance stays put
                if sweeps > 0 || snap.abs() > GROUND_SNAP_TOLERANCE {
                    body.position = sweep_position + direction * snap;
                }
            }
            report.floor_distance = (body.position - hit.impact_point).dot(up).max(0.0);
            return report;
        }

        report.floor_distance = (body.position - hit.impact_point).dot(up).max(0.0);

        // Slide along the unstable surface for a short rebound
        let advance = direction * hit.distance + up * COLLISION_OFFSET.max(hit.distance);
        sweep_position += advance;
        remaining = GROUND_PROBING_REBOUND_DISTANCE.min((remaining - advance.length()).max(0.0));
        direction = project_on_plane(direction, hit.normal).normalize_or_zero();
        if direction == glam::Vec3::ZERO {
            break;
        }

        sweeps += 1;
    }

    report
}
