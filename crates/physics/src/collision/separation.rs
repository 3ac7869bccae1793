//! Closed-form separation between a body shape and a box brush.
//!
//! Large boxes (floors, walls) are where iterative contact solvers lose the
//! most precision, and they are also where the motor spends most of its
//! time. Box brushes are therefore answered here directly in the brush's
//! local frame.
//!
//! Separation is signed: positive is the gap between the shapes, negative
//! is how far the body has to move along `normal` to get clear.

use glam::{Quat, Vec3};

use super::shape::BodyShape;

/// Golden-section steps used to find the closest point on a capsule core.
const SEGMENT_SEARCH_ITERATIONS: u32 = 40;

/// Core segments closer than this to a box count as touching it.
const SEGMENT_CONTACT_EPSILON: f32 = 1.0e-6;

/// Axes shorter than this (parallel edges) are skipped by the box test.
const AXIS_EPSILON: f32 = 1.0e-6;

/// Edge axes must beat face axes by this much to be chosen.
const EDGE_AXIS_BIAS: f32 = 1.0e-5;

/// Sweeps stop once the gap is this small.
const SWEEP_TOLERANCE: f32 = 1.0e-5;

/// Upper bound on the root-finding steps of a sweep.
const MAX_SWEEP_ITERATIONS: u32 = 32;

/// A box brush posed in the world.
#[derive(Debug, Clone, Copy)]
pub(super) struct BoxBrush {
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

/// Signed separation between a body and a box brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Separation {
    /// Gap when positive, penetration depth when negative.
    pub distance: f32,
    /// Unit direction from the brush toward the body, in world space.
    pub normal: Vec3,
    /// Point on (or inside) the brush nearest the body, in world space.
    pub point: Vec3,
}

/// Result of sweeping a body into a box brush.
#[derive(Debug, Clone, Copy)]
pub(super) struct BoxSweep {
    pub distance: f32,
    pub start_penetrating: bool,
    pub separation: Separation,
}

impl BoxBrush {
    /// Separation of `shape` whose bottom-center sits at `position`.
    pub fn separation(&self, shape: &BodyShape, position: Vec3, rotation: Quat) -> Separation {
        let inverse = self.rotation.inverse();
        let center = position + rotation * (Vec3::Y * shape.half_height());
        let local_center = inverse * (center - self.center);
        let local_rotation = inverse * rotation;

        let local = match *shape {
            BodyShape::Capsule { radius, height } => {
                let core_half = (height - 2.0 * radius).max(0.0) / 2.0;
                let axis = local_rotation * Vec3::Y * core_half;
                self.capsule_separation(local_center - axis, local_center + axis, radius)
            }
            BodyShape::Box { half_extents } => self.box_separation(local_center, local_rotation, half_extents),
        };

        Separation {
            distance: local.distance,
            normal: self.rotation * local.normal,
            point: self.center + self.rotation * local.point,
        }
    }

    /// Sweep `shape` from `origin` along the unit vector `direction`.
    ///
    /// The separation along a straight path is convex, so Newton steps from
    /// the near side never pass the first contact.
    pub fn sweep(
        &self,
        shape: &BodyShape,
        origin: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<BoxSweep> {
        let start = self.separation(shape, origin, rotation);
        if start.distance < 0.0 {
            return Some(BoxSweep {
                distance: 0.0,
                start_penetrating: true,
                separation: start,
            });
        }

        let mut distance = 0.0;
        let mut separation = start;
        for _ in 0..MAX_SWEEP_ITERATIONS {
            let closing = -direction.dot(separation.normal);
            if separation.distance <= SWEEP_TOLERANCE {
                // Touching at the start but leaving
                if distance == 0.0 && closing <= 0.0 {
                    return None;
                }
                break;
            }
            if closing <= f32::EPSILON {
                return None;
            }
            distance += separation.distance / closing;
            if distance > max_distance {
                return None;
            }
            separation = self.separation(shape, origin + direction * distance, rotation);
        }

        Some(BoxSweep {
            distance,
            start_penetrating: false,
            separation,
        })
    }

    fn capsule_separation(&self, a: Vec3, b: Vec3, radius: f32) -> Separation {
        let h = self.half_extents;
        let gap_at = |t: f32| {
            let p = a.lerp(b, t);
            let q = p.clamp(-h, h);
            (p.distance_squared(q), p, q)
        };

        // Distance from a segment to a convex set is convex along the segment
        let mut best = gap_at(0.0);
        let end = gap_at(1.0);
        if end.0 < best.0 {
            best = end;
        }

        let ratio = (5f32.sqrt() - 1.0) / 2.0;
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        let mut x1 = hi - ratio * (hi - lo);
        let mut x2 = lo + ratio * (hi - lo);
        let mut f1 = gap_at(x1);
        let mut f2 = gap_at(x2);
        for _ in 0..SEGMENT_SEARCH_ITERATIONS {
            if f1.0 <= f2.0 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - ratio * (hi - lo);
                f1 = gap_at(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + ratio * (hi - lo);
                f2 = gap_at(x2);
            }
        }
        for candidate in [f1, f2] {
            if candidate.0 < best.0 {
                best = candidate;
            }
        }

        let (gap_squared, segment_point, box_point) = best;
        let gap = gap_squared.sqrt();
        if gap > SEGMENT_CONTACT_EPSILON {
            return Separation {
                distance: gap - radius,
                normal: (segment_point - box_point) / gap,
                point: box_point,
            };
        }

        // Core touches the box: push out through the cheapest face
        let mut push = f32::MAX;
        let mut normal = Vec3::Y;
        for axis in 0..3 {
            let low = a[axis].min(b[axis]);
            let high = a[axis].max(b[axis]);
            let up = h[axis] + radius - low;
            let down = h[axis] + radius + high;
            if up < push {
                push = up;
                normal = unit(axis, 1.0);
            }
            if down < push {
                push = down;
                normal = unit(axis, -1.0);
            }
        }

        Separation {
            distance: -push,
            normal,
            point: box_point,
        }
    }

    fn box_separation(&self, center: Vec3, rotation: Quat, half_extents: Vec3) -> Separation {
        let h = self.half_extents;
        let body_axes = [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z];
        let brush_axes = [Vec3::X, Vec3::Y, Vec3::Z];

        let gap_along = |axis: Vec3| {
            let projection = center.dot(axis);
            let body_reach: f32 = (0..3).map(|i| half_extents[i] * body_axes[i].dot(axis).abs()).sum();
            let brush_reach = h.x * axis.x.abs() + h.y * axis.y.abs() + h.z * axis.z.abs();
            let outward = if projection < 0.0 { -axis } else { axis };
            (projection.abs() - body_reach - brush_reach, outward)
        };

        let mut best = (f32::MIN, Vec3::Y);
        for axis in brush_axes.iter().chain(body_axes.iter()) {
            let candidate = gap_along(*axis);
            if candidate.0 > best.0 {
                best = candidate;
            }
        }
        for brush_axis in brush_axes {
            for body_axis in body_axes {
                let cross = brush_axis.cross(body_axis);
                let length = cross.length();
                if length < AXIS_EPSILON {
                    continue;
                }
                let candidate = gap_along(cross / length);
                if candidate.0 > best.0 + EDGE_AXIS_BIAS {
                    best = candidate;
                }
            }
        }

        let (distance, normal) = best;

        // Body corner reaching furthest toward the brush, pulled onto it
        let mut corner = center;
        for i in 0..3 {
            let reach = body_axes[i] * half_extents[i];
            corner -= reach * reach.dot(normal).signum();
        }

        Separation {
            distance,
            normal,
            point: corner.clamp(-h, h),
        }
    }
}

fn unit(axis: usize, sign: f32) -> Vec3 {
    let mut v = Vec3::ZERO;
    v[axis] = sign;
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> BoxBrush {
        BoxBrush {
            center: Vec3::new(0.0, -0.5, 0.0),
            rotation: Quat::IDENTITY,
            half_extents: Vec3::new(50.0, 0.5, 50.0),
        }
    }

    fn capsule() -> BodyShape {
        BodyShape::capsule(0.5, 2.0)
    }

    #[test]
    fn test_capsule_gap_above_floor() {
        let separation = floor().separation(&capsule(), Vec3::new(3.0, 0.25, -7.0), Quat::IDENTITY);

        assert!((separation.distance - 0.25).abs() < 1e-6, "distance={}", separation.distance);
        assert!((separation.normal - Vec3::Y).length() < 1e-6);
        assert!((separation.point - Vec3::new(3.0, 0.0, -7.0)).length() < 1e-5);
    }

    #[test]
    fn test_capsule_depth_below_and_past_the_core() {
        for sink in [0.05_f32, 0.2, 0.5, 0.8] {
            let separation = floor().separation(&capsule(), Vec3::new(0.0, -sink, 0.0), Quat::IDENTITY);

            assert!(
                (separation.distance + sink).abs() < 1e-5,
                "sink {} reported {}",
                sink,
                separation.distance
            );
            assert!((separation.normal - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn test_capsule_against_rotated_wall() {
        let wall = BoxBrush {
            center: Vec3::new(3.0, 1.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            half_extents: Vec3::new(2.0, 1.0, 0.5),
        };

        // Rotated wall's near face is at x = 2.5
        let separation = wall.separation(&capsule(), Vec3::new(1.5, 0.0, 0.0), Quat::IDENTITY);

        assert!((separation.distance - 0.5).abs() < 1e-5, "distance={}", separation.distance);
        assert!((separation.normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_box_body_on_floor() {
        let shape = BodyShape::Box {
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        };

        let resting = floor().separation(&shape, Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY);
        assert!((resting.distance - 0.01).abs() < 1e-5);
        assert!((resting.normal - Vec3::Y).length() < 1e-6);

        let sunk = floor().separation(&shape, Vec3::new(0.0, -0.3, 0.0), Quat::IDENTITY);
        assert!((sunk.distance + 0.3).abs() < 1e-5);
        assert!((sunk.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_sweep_lands_exactly() {
        let hit = floor()
            .sweep(&capsule(), Vec3::new(0.0, 0.11, 0.0), Quat::IDENTITY, Vec3::NEG_Y, 0.6)
            .expect("floor is in reach");

        assert!(!hit.start_penetrating);
        assert!((hit.distance - 0.11).abs() < 1e-5, "distance={}", hit.distance);
    }

    #[test]
    fn test_sweep_parallel_to_face_misses() {
        let hit = floor().sweep(&capsule(), Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY, Vec3::X, 10.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_sweep_starting_inside_reports_penetration() {
        let hit = floor()
            .sweep(&capsule(), Vec3::new(0.0, -0.2, 0.0), Quat::IDENTITY, Vec3::X, 1.0)
            .expect("inside the floor");

        assert!(hit.start_penetrating);
        assert_eq!(hit.distance, 0.0);
        assert!((hit.separation.distance + 0.2).abs() < 1e-5);
    }
}
