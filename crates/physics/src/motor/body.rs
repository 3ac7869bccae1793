//! The controlled body and its transform operations.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::{BodyShape, CollisionQuery, HitResult};

use super::COLLISION_OFFSET;

/// The body a motor moves.
///
/// `position` is the bottom-center of the shape; the up axis is the body's
/// local +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlledBody {
    /// Bottom-center position in world space.
    pub position: Vec3,
    /// Orientation in world space.
    pub rotation: Quat,
    /// Collision shape.
    pub shape: BodyShape,
    /// Velocity in meters/second.
    pub velocity: Vec3,
}

impl ControlledBody {
    /// Create an upright body at rest.
    pub fn new(shape: BodyShape, position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            shape,
            velocity: Vec3::ZERO,
        }
    }

    /// The body's up axis.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Geometric center of the shape.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.position + self.up() * self.shape.half_height()
    }

    /// Sweep the body's shape from `origin` without moving it.
    pub fn sweep_from(
        &self,
        query: &dyn CollisionQuery,
        origin: Vec3,
        direction: Vec3,
        distance: f32,
    ) -> HitResult {
        query.sweep_shape(&self.shape, origin, self.rotation, direction, distance)
    }

    /// Sweep that starts `backstep` behind `origin`.
    ///
    /// Reported distances are measured from `origin`, so a body resting
    /// slightly inside a surface gets a negative distance instead of a
    /// starting-penetration result. If the backstepped origin is itself
    /// blocked the sweep is retried from `origin`.
    pub fn sweep_backstepped(
        &self,
        query: &dyn CollisionQuery,
        origin: Vec3,
        direction: Vec3,
        distance: f32,
        backstep: f32,
    ) -> HitResult {
        let dir = direction.normalize_or_zero();
        let hit = self.sweep_from(query, origin - dir * backstep, dir, distance + backstep);

        if hit.start_penetrating {
            return self.sweep_from(query, origin, dir, distance);
        }

        let mut hit = hit;
        hit.distance -= backstep;
        if hit.blocked {
            hit.time = if distance > 0.0 {
                (hit.distance / distance).clamp(0.0, 1.0)
            } else {
                0.0
            };
        } else {
            hit.distance = distance;
        }
        hit
    }

    /// Move by `delta`, stopping `COLLISION_OFFSET` short of the first thing hit.
    ///
    /// Returns the sweep result. A body that starts inside something does
    /// not move.
    pub fn move_by(&mut self, query: &dyn CollisionQuery, delta: Vec3) -> HitResult {
        let distance = delta.length();
        if distance <= 0.0 {
            return HitResult::miss(0.0);
        }
        let direction = delta / distance;

        let hit = self.sweep_from(query, self.position, direction, distance + COLLISION_OFFSET);

        if hit.start_penetrating {
            return hit;
        }
        if hit.blocked {
            self.position += direction * (hit.distance - COLLISION_OFFSET).max(0.0);
            hit
        } else {
            self.position += delta;
            HitResult::miss(distance)
        }
    }

    /// Move by `delta` without checking for collisions.
    #[inline]
    pub fn teleport_by(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate in place unless the new orientation would overlap something.
    ///
    /// Returns whether the rotation was applied.
    pub fn rotate_to(&mut self, query: &dyn CollisionQuery, rotation: Quat) -> bool {
        let rotation = rotation.normalize();
        if query.overlaps(&self.shape, self.position, rotation) {
            log::debug!("rotation rejected at {:?}: would overlap", self.position);
            return false;
        }
        self.rotation = rotation;
        true
    }
}
