//! The collision query service used by the motor.
//!
//! The motor never talks to a concrete world. It sweeps, casts and tests
//! overlaps through [`CollisionQuery`], so a host can back it with any
//! collision engine. [`super::CollisionWorld`] is the bundled parry3d
//! implementation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::shape::BodyShape;

/// Identifier of a collision object, assigned by the world that owns it.
pub type ObjectId = u32;

/// Result of a shape sweep or line cast.
///
/// A miss is represented with `blocked == false`; in that case only
/// `distance` (the full query length) and `time == 1.0` are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Whether the query was stopped by something.
    pub blocked: bool,

    /// Whether the shape (or ray origin) was already inside the hit object.
    pub start_penetrating: bool,

    /// Distance travelled along the query direction before the impact.
    pub distance: f32,

    /// `distance` as a fraction of the query length, in `[0, 1]`.
    pub time: f32,

    /// World-space point of contact on the hit object.
    pub impact_point: Vec3,

    /// Normal of the hit object's surface at the impact point.
    ///
    /// On box edges and corners this is the face most opposed to the query
    /// direction, so a capsule clipping the top edge of a crate reads the
    /// crate's side as a vertical wall.
    pub impact_normal: Vec3,

    /// Separation normal between the swept shape and the hit object.
    ///
    /// Points from the hit object toward the swept shape. For a capsule
    /// resting on an edge this leans toward the capsule's center.
    pub normal: Vec3,

    /// Object that was hit, if any.
    pub object: Option<ObjectId>,
}

impl Default for HitResult {
    fn default() -> Self {
        Self::miss(0.0)
    }
}

impl HitResult {
    /// A query that travelled `distance` without touching anything.
    pub fn miss(distance: f32) -> Self {
        Self {
            blocked: false,
            start_penetrating: false,
            distance,
            time: 1.0,
            impact_point: Vec3::ZERO,
            impact_normal: Vec3::ZERO,
            normal: Vec3::ZERO,
            object: None,
        }
    }

    /// A blocking hit at `distance` along a query of length `max_distance`.
    pub fn blocking(
        distance: f32,
        max_distance: f32,
        impact_point: Vec3,
        impact_normal: Vec3,
        normal: Vec3,
        object: Option<ObjectId>,
    ) -> Self {
        let time = if max_distance > 0.0 {
            (distance / max_distance).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            blocked: true,
            start_penetrating: false,
            distance,
            time,
            impact_point,
            impact_normal,
            normal,
            object,
        }
    }

    /// Check if this is a valid blocking hit (blocked, not started inside).
    #[inline]
    pub fn is_valid_blocking_hit(&self) -> bool {
        self.blocked && !self.start_penetrating
    }
}

/// How far and which way a shape must move to stop overlapping an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Penetration {
    /// Unit direction that separates the shape from the object.
    pub direction: Vec3,
    /// Overlap depth along `direction`.
    pub depth: f32,
    /// Object being penetrated.
    pub object: Option<ObjectId>,
}

/// Motion of an object a body can stand on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseMotion {
    /// Whether the object is driven by a physics simulation rather than
    /// scripted/kinematic motion.
    pub simulates_physics: bool,
    /// Velocity reported by the physics simulation.
    pub physics_velocity: Vec3,
    /// Velocity reported by the object's owner (script or animation).
    pub owner_velocity: Vec3,
    /// Angular velocity in radians per second.
    pub angular_velocity: Vec3,
    /// Point the angular velocity rotates around.
    pub center_of_mass: Vec3,
}

impl BaseMotion {
    /// Kinematic motion with a pure linear velocity.
    pub fn linear(velocity: Vec3) -> Self {
        Self {
            owner_velocity: velocity,
            ..Default::default()
        }
    }

    /// Linear velocity of the object itself.
    ///
    /// Fully simulated objects report the physics velocity; everything else
    /// reports what its owner says it is doing.
    pub fn linear_velocity(&self) -> Vec3 {
        if self.simulates_physics {
            self.physics_velocity
        } else {
            self.owner_velocity
        }
    }

    /// Velocity of the object's surface at `point`.
    pub fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.linear_velocity() + self.angular_velocity.cross(point - self.center_of_mass)
    }
}

/// Blocking collision queries against a scene.
///
/// All positions are bottom-center positions of `shape` (see [`BodyShape`]).
/// Implementations must be deterministic and side-effect free.
pub trait CollisionQuery {
    /// Sweep `shape` from `origin` along `direction` for up to `max_distance`.
    fn sweep_shape(
        &self,
        shape: &BodyShape,
        origin: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
    ) -> HitResult;

    /// Cast a ray from `origin` along `direction` for up to `max_distance`.
    fn line_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> HitResult;

    /// Check whether `shape` placed at `position` overlaps anything.
    fn overlaps(&self, shape: &BodyShape, position: Vec3, rotation: Quat) -> bool;

    /// Deepest penetration of `shape` placed at `position`, if any.
    fn penetration(&self, shape: &BodyShape, position: Vec3, rotation: Quat) -> Option<Penetration>;

    /// Motion of `object` when it is something a body can ride.
    ///
    /// Static geometry returns `None`.
    fn base_motion(&self, object: ObjectId) -> Option<BaseMotion> {
        let _ = object;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss() {
        let hit = HitResult::miss(3.0);
        assert!(!hit.blocked);
        assert!(!hit.is_valid_blocking_hit());
        assert_eq!(hit.time, 1.0);
        assert_eq!(hit.distance, 3.0);
    }

    #[test]
    fn test_blocking_time_is_fraction() {
        let hit = HitResult::blocking(1.0, 4.0, Vec3::ZERO, Vec3::Y, Vec3::Y, Some(2));
        assert!(hit.is_valid_blocking_hit());
        assert_eq!(hit.time, 0.25);
        assert_eq!(hit.object, Some(2));
    }

    #[test]
    fn test_base_velocity_prefers_physics_when_simulated() {
        let mut motion = BaseMotion {
            physics_velocity: Vec3::X,
            owner_velocity: Vec3::Z,
            ..Default::default()
        };
        assert_eq!(motion.linear_velocity(), Vec3::Z);

        motion.simulates_physics = true;
        assert_eq!(motion.linear_velocity(), Vec3::X);
    }

    #[test]
    fn test_base_velocity_includes_tangential_term() {
        let motion = BaseMotion {
            angular_velocity: Vec3::new(0.0, 1.0, 0.0),
            center_of_mass: Vec3::ZERO,
            ..Default::default()
        };
        // Point 2m out along +X on a platform spinning about +Y moves along -Z.
        let v = motion.velocity_at(Vec3::new(2.0, 0.0, 0.0));
        assert!((v - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5, "got {:?}", v);
    }
}
