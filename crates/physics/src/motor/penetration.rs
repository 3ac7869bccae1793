//! Penetration detection and resolution.

use glam::Vec3;

use crate::collision::CollisionQuery;

use super::body::ControlledBody;
use super::{MotionContext, COLLISION_OFFSET, PENETRATION_TEST_DISTANCE};

const TEST_AXES: [Vec3; 6] = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Depenetration {
    /// The body was not penetrating anything.
    Clear,
    /// The body was pushed out.
    Resolved { displacement: Vec3 },
    /// The budget ran out; the body is back where it started.
    Stuck,
}

/// Whether the body currently starts inside something.
pub fn is_penetrating(query: &dyn CollisionQuery, body: &ControlledBody) -> bool {
    TEST_AXES.iter().any(|axis| {
        body.sweep_from(query, body.position, *axis, PENETRATION_TEST_DISTANCE)
            .start_penetrating
    })
}

/// Push the body out of whatever it overlaps.
///
/// Works in sub-steps along the query's separation direction. A sub-step
/// that does not reduce the overlap is undone and ends the attempt.
pub fn resolve(ctx: MotionContext<'_>, body: &mut ControlledBody) -> Depenetration {
    if !is_penetrating(ctx.query, body) {
        return Depenetration::Clear;
    }

    let config = ctx.config;
    let start = body.position;
    let mut budget = config.max_depenetration_distance;

    for _ in 0..config.max_decollision_iterations {
        let Some(penetration) = ctx.query.penetration(&body.shape, body.position, body.rotation) else {
            break;
        };

        let push = (penetration.depth + COLLISION_OFFSET).min(budget);
        if push <= 0.0 {
            break;
        }

        let before = body.position;
        body.teleport_by(penetration.direction * push);
        budget -= push;

        if let Some(after) = ctx.query.penetration(&body.shape, body.position, body.rotation) {
            if after.depth >= penetration.depth {
                body.position = before;
                break;
            }
        }
    }

    if is_penetrating(ctx.query, body) {
        log::debug!("depenetration failed at {:?}", start);
        body.position = start;
        return Depenetration::Stuck;
    }

    log::trace!("depenetrated by {:?}", body.position - start);
    Depenetration::Resolved {
        displacement: body.position - start,
    }
}
