//! Hit stability evaluation.
//!
//! Decides whether the body could stand on a hit, looks for ledges around it
//! and checks whether an unstable hit is really the riser of a step.
//!
//! # Ledge detection
//!
//! Two short line casts start just above the hit, one nudged toward the body
//! (inner) and one away from it (outer):
//!
//! ```text
//!        inner | | outer
//!   body  ->   v v
//!   ___________.
//!              |      <- one cast finds ground, the other does not
//!              |___
//! ```
//!
//! When one side is stable and the other is not the hit sits on a ledge.

use glam::Vec3;

use crate::collision::HitResult;

use super::body::ControlledBody;
use super::config::{MotorConfig, StepHandling};
use super::math::{angle_degrees, project_on_normal, project_on_plane};
use super::report::{GroundingReport, HitStabilityReport, LedgeReport, StepCandidate};
use super::{MotionContext, COLLISION_OFFSET, SECONDARY_PROBES_HORIZONTAL, SECONDARY_PROBES_VERTICAL};

/// Whether a surface with `normal` is walkable for a body with `up`.
pub fn is_stable_on_normal(config: &MotorConfig, up: Vec3, normal: Vec3) -> bool {
    angle_degrees(up, normal) <= config.max_stable_slope_angle
}

/// Evaluate a hit the body made while at `at_position`.
///
/// `velocity` is the body's velocity at the time of the hit; it decides
/// whether the body is heading toward a ledge.
pub fn evaluate_hit_stability(
    ctx: MotionContext<'_>,
    body: &ControlledBody,
    at_position: Vec3,
    hit: &HitResult,
    velocity: Vec3,
) -> HitStabilityReport {
    let config = ctx.config;
    let mut report = HitStabilityReport::unstable(hit.impact_normal);

    if !config.solve_grounding {
        return report;
    }

    let up = body.up();
    let inner_direction = project_on_plane(hit.normal, up).normalize_or_zero();

    report.is_stable = is_stable_on_normal(config, up, hit.impact_normal);

    if config.ledge_and_denivelation_handling {
        let cast_length = config.ledge_check_height() + SECONDARY_PROBES_VERTICAL;
        let start = hit.impact_point + up * SECONDARY_PROBES_VERTICAL;
        let inner_start = start + inner_direction * SECONDARY_PROBES_HORIZONTAL;
        let outer_start = start - inner_direction * SECONDARY_PROBES_HORIZONTAL;

        let mut inner_stable = false;
        let mut outer_stable = false;

        let inner = ctx.query.line_cast(inner_start, -up, cast_length);
        if inner.is_valid_blocking_hit() {
            report.inner_normal = inner.impact_normal;
            report.found_inner_normal = true;
            inner_stable = is_stable_on_normal(config, up, inner.impact_normal);
        }

        let outer = ctx.query.line_cast(outer_start, -up, cast_length);
        if outer.is_valid_blocking_hit() {
            report.outer_normal = outer.impact_normal;
            report.found_outer_normal = true;
            outer_stable = is_stable_on_normal(config, up, outer.impact_normal);
        }

        if inner_stable != outer_stable {
            let ground_normal = if outer_stable {
                report.outer_normal
            } else {
                report.inner_normal
            };
            let right = hit.normal.cross(ground_normal).normalize_or_zero();
            let facing = project_on_plane(ground_normal.cross(right), up).normalize_or_zero();

            report.ledge = Some(LedgeReport {
                on_empty_side: outer_stable && !inner_stable,
                moving_towards_empty_side: velocity.normalize_or_zero().dot(facing) > 0.0,
                distance_from_ledge: project_on_plane(hit.impact_point - at_position, up).length(),
                ground_normal,
                right,
                facing,
            });
        }
    }

    if config.step_handling != StepHandling::None && !report.is_stable {
        if let Some(step) = detect_steps(ctx, body, at_position, hit, inner_direction) {
            report.step = Some(step);
            report.is_stable = true;
        }
    }

    report
}

/// Whether a stable hit may also be snapped to.
///
/// Ledges being walked off, hanging too far over a drop and sharp changes
/// of slope all keep the body from snapping even on walkable ground.
pub fn is_stable_with_special_cases(
    config: &MotorConfig,
    report: &HitStabilityReport,
    velocity: Vec3,
    last_grounding: &GroundingReport,
) -> bool {
    if !config.ledge_and_denivelation_handling {
        return true;
    }

    if let Some(ledge) = &report.ledge {
        if ledge.moving_towards_empty_side {
            let toward_ledge = project_on_normal(velocity, ledge.facing);
            if toward_ledge.length() >= config.max_velocity_for_ledge_snap {
                return false;
            }
        }

        if ledge.on_empty_side && ledge.distance_from_ledge > config.max_stable_distance_from_ledge {
            return false;
        }
    }

    if last_grounding.found_any_ground
        && report.inner_normal.length_squared() > 0.0
        && report.outer_normal.length_squared() > 0.0
    {
        if angle_degrees(report.inner_normal, report.outer_normal) > config.max_stable_denivelation_angle {
            return false;
        }
        if angle_degrees(last_grounding.inner_ground_normal, report.outer_normal)
            > config.max_stable_denivelation_angle
        {
            return false;
        }
    }

    true
}

/// Look for a step on top of an unstable hit.
fn detect_steps(
    ctx: MotionContext<'_>,
    body: &ControlledBody,
    at_position: Vec3,
    hit: &HitResult,
    inner_direction: Vec3,
) -> Option<StepCandidate> {
    let config = ctx.config;
    let up = body.up();

    let to_hit = hit.impact_point - at_position;
    let vertical_to_hit = project_on_normal(to_hit, up);
    let horizontal_to_hit = project_on_plane(to_hit, up).normalize_or_zero();

    // Body-sized sweep down onto the top of the obstruction
    let start = (hit.impact_point - vertical_to_hit)
        + up * config.max_step_height
        + horizontal_to_hit * (COLLISION_OFFSET * 3.0);
    let landing = body.sweep_from(ctx.query, start, -up, config.max_step_height + COLLISION_OFFSET);

    if let Some(step) = check_step_validity(ctx, body, at_position, inner_direction, start, &landing) {
        return Some(step);
    }

    if config.step_handling == StepHandling::Extra {
        let start = at_position + up * config.max_step_height - inner_direction * config.min_required_step_depth;
        let landing = body.sweep_from(ctx.query, start, -up, config.max_step_height - COLLISION_OFFSET);
        return check_step_validity(ctx, body, at_position, inner_direction, start, &landing);
    }

    None
}

fn check_step_validity(
    ctx: MotionContext<'_>,
    body: &ControlledBody,
    at_position: Vec3,
    inner_direction: Vec3,
    start: Vec3,
    landing: &HitResult,
) -> Option<StepCandidate> {
    if !landing.is_valid_blocking_hit() {
        return None;
    }

    let config = ctx.config;
    let up = body.up();
    let landing_position = start - up * (landing.distance - COLLISION_OFFSET);

    if ctx.query.overlaps(&body.shape, landing_position, body.rotation) {
        return None;
    }

    // Slope right past the step's edge
    let outer_slope = ctx.query.line_cast(
        landing.impact_point + up * SECONDARY_PROBES_VERTICAL - inner_direction * SECONDARY_PROBES_HORIZONTAL,
        -up,
        config.max_step_height + SECONDARY_PROBES_VERTICAL,
    );
    if !outer_slope.is_valid_blocking_hit() || !is_stable_on_normal(config, up, outer_slope.impact_normal) {
        return None;
    }

    // Room to rise to the step height where the body stands
    let rise = config.max_step_height - landing.distance;
    if rise > 0.0 && body.sweep_from(ctx.query, at_position, up, rise).blocked {
        return None;
    }

    if !config.allow_stepping_without_stable_grounding {
        let inner_origin = at_position + project_on_normal(landing_position - at_position, up);
        let inner = ctx.query.line_cast(inner_origin, -up, config.max_step_height);
        if !inner.is_valid_blocking_hit() || !is_stable_on_normal(config, up, inner.impact_normal) {
            return None;
        }
    }

    Some(StepCandidate {
        object: landing.object,
        landing_point: landing.impact_point,
    })
}
