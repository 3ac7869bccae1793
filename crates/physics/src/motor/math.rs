//! Vector helpers shared by the motor phases.
//!
//! Every helper tolerates zero-length input and returns a zero vector (or an
//! "unstable" answer) rather than producing NaNs.

use glam::Vec3;

const EPSILON_SQ: f32 = 1.0e-12;

/// Angle between two directions, in degrees.
///
/// Returns 180 when either vector has no length so that degenerate normals
/// never classify as stable ground.
pub fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 180.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Remove the component of `vector` along `normal`.
pub fn project_on_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    match normal.try_normalize() {
        Some(n) => vector - n * vector.dot(n),
        None => vector,
    }
}

/// Component of `vector` along `normal`.
pub fn project_on_normal(vector: Vec3, normal: Vec3) -> Vec3 {
    let length_sq = normal.length_squared();
    if length_sq < EPSILON_SQ {
        return Vec3::ZERO;
    }
    normal * (vector.dot(normal) / length_sq)
}

/// Unit direction along `surface_normal`'s plane that keeps the heading of
/// `direction` as seen from above (relative to `up`).
///
/// Walking up a ramp keeps the same compass heading while the direction tilts
/// to follow the surface. When `direction` is parallel to `up` the heading is
/// undefined and the plain plane projection is used instead.
pub fn direction_tangent_to_surface(direction: Vec3, surface_normal: Vec3, up: Vec3) -> Vec3 {
    let right = direction.cross(up);
    let tangent = surface_normal.cross(right);
    if tangent.length_squared() > EPSILON_SQ {
        return tangent.normalize();
    }
    project_on_plane(direction, surface_normal).normalize_or_zero()
}

/// Vector with the same direction and `length`, or zero.
#[inline]
pub fn with_length(vector: Vec3, length: f32) -> Vec3 {
    vector.normalize_or_zero() * length
}
