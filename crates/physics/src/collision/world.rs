//! Collision world containing all static and moving geometry.
//!
//! The collision world stores every collidable brush and answers the
//! [`CollisionQuery`] calls the motor makes: shape sweeps, ray casts,
//! overlap tests and penetration queries.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::{cast_shapes, contact, Ray, ShapeCastHit, ShapeCastOptions, ShapeCastStatus};
use parry3d::shape::{Capsule, Cuboid, Shape, SharedShape};
use parry3d::transformation::try_convex_hull;
use thiserror::Error;

use super::flags::ContentFlags;
use super::query::{BaseMotion, CollisionQuery, HitResult, ObjectId, Penetration};
use super::separation::{BoxBrush, BoxSweep};
use super::shape::BodyShape;

/// How far a witness point may sit from a box face and still count as on it.
const FACE_TOLERANCE: f32 = 1.0e-3;

/// Length of the short ray used to read face normals on non-box shapes.
const FACE_PROBE_DISTANCE: f32 = 0.01;

/// Hull points must span at least this much volume.
const MIN_HULL_VOLUME: f32 = 1.0e-6;

/// Errors raised while building or editing a world.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("convex hull from {0} points is degenerate")]
    DegenerateHull(usize),

    #[error("no brush with id {0}")]
    UnknownBrush(ObjectId),
}

/// Scripted motion of a brush.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrushMotion {
    /// Linear velocity (meters/second).
    pub velocity: Vec3,
    /// Angular velocity about the brush center (radians/second).
    pub angular_velocity: Vec3,
    /// Whether a physics simulation drives this brush.
    ///
    /// Bodies riding a simulated brush follow it but never inherit its
    /// velocity when they step off.
    pub simulates_physics: bool,
}

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct CollisionBrush {
    /// Unique identifier for this brush.
    pub id: ObjectId,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position of the shape's local origin in world space.
    pub position: Vec3,
    /// Orientation in world space.
    pub rotation: Quat,
    /// Content flags (solid, sensor, etc.).
    pub contents: ContentFlags,
    /// Motion for platforms and other moving geometry.
    pub motion: Option<BrushMotion>,
}

impl CollisionBrush {
    /// World transform as a parry isometry.
    pub fn isometry(&self) -> Isometry<Real> {
        isometry(self.position, self.rotation)
    }

    /// Box brushes are answered in closed form instead of through parry.
    fn as_box(&self) -> Option<BoxBrush> {
        self.shape.as_cuboid().map(|cuboid| BoxBrush {
            center: self.position,
            rotation: self.rotation,
            half_extents: from_vector(&cuboid.half_extents),
        })
    }
}

/// The collision world containing all geometry.
///
/// Supports:
/// - Box brushes (axis-aligned and oriented)
/// - Convex hull brushes (ramps, wedges)
/// - Moving brushes that bodies can ride
///
/// # Thread Safety
///
/// Queries take `&self`, so the world can be shared across threads while
/// nobody is editing it.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    /// All brushes, static and moving.
    brushes: Vec<CollisionBrush>,
    /// Next brush ID to assign.
    next_id: ObjectId,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            brushes: Vec::new(),
            next_id: 0,
        }
    }

    /// Add an axis-aligned box to the world.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> ObjectId {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents)
    }

    /// Add a rotated box to the world. Tilted boxes make simple ramps.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
    ) -> ObjectId {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.push_brush(shape, center, rotation, contents, None)
    }

    /// Add a solid box that moves with the given motion when the world advances.
    pub fn add_moving_box(&mut self, center: Vec3, half_extents: Vec3, motion: BrushMotion) -> ObjectId {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        self.push_brush(shape, center, Quat::IDENTITY, ContentFlags::SOLID, Some(motion))
    }

    /// Add a convex hull to the world.
    ///
    /// # Arguments
    ///
    /// * `points` - Vertices defining the convex hull, in world space
    /// * `contents` - Content flags for collision filtering
    pub fn add_convex_hull(&mut self, points: &[Vec3], contents: ContentFlags) -> Result<ObjectId, WorldError> {
        let degenerate = WorldError::DegenerateHull(points.len());
        if !spans_volume(points) {
            return Err(degenerate);
        }

        let parry_points: Vec<Point<Real>> = points.iter().map(|p| to_point(*p)).collect();
        let (vertices, indices) =
            try_convex_hull(&parry_points).map_err(|_| WorldError::DegenerateHull(points.len()))?;
        let shape = SharedShape::convex_mesh(vertices, &indices).ok_or(degenerate)?;

        Ok(self.push_brush(shape, Vec3::ZERO, Quat::IDENTITY, contents, None))
    }

    /// Get a brush by ID.
    pub fn brush(&self, id: ObjectId) -> Option<&CollisionBrush> {
        self.brushes.iter().find(|b| b.id == id)
    }

    /// Replace the motion of a brush. `None` freezes it.
    pub fn set_motion(&mut self, id: ObjectId, motion: Option<BrushMotion>) -> Result<(), WorldError> {
        let brush = self.brush_mut(id)?;
        brush.motion = motion;
        Ok(())
    }

    /// Teleport a brush.
    pub fn set_pose(&mut self, id: ObjectId, position: Vec3, rotation: Quat) -> Result<(), WorldError> {
        let brush = self.brush_mut(id)?;
        brush.position = position;
        brush.rotation = rotation;
        Ok(())
    }

    /// Remove a brush from the world.
    pub fn remove_brush(&mut self, id: ObjectId) -> Result<CollisionBrush, WorldError> {
        let index = self
            .brushes
            .iter()
            .position(|b| b.id == id)
            .ok_or(WorldError::UnknownBrush(id))?;
        Ok(self.brushes.remove(index))
    }

    /// Remove all collision geometry.
    pub fn clear(&mut self) {
        self.brushes.clear();
    }

    /// Get the number of collision brushes.
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Move every brush that has a motion by one time step.
    pub fn advance(&mut self, delta_time: f32) {
        for brush in &mut self.brushes {
            if let Some(motion) = brush.motion {
                brush.position += motion.velocity * delta_time;
                let spin = Quat::from_scaled_axis(motion.angular_velocity * delta_time);
                brush.rotation = (spin * brush.rotation).normalize();
            }
        }
    }

    /// Sweep a body shape through the world.
    ///
    /// This is the primary collision query. It casts `shape` from `origin`
    /// (bottom-center) along `direction` and reports the closest blocking
    /// brush whose contents intersect `mask`.
    pub fn sweep(
        &self,
        shape: &BodyShape,
        origin: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
    ) -> HitResult {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_distance <= 0.0 {
            return HitResult::miss(max_distance.max(0.0));
        }

        let body = ParryBody::new(shape);
        let body_pos = body_isometry(shape, origin, rotation);
        let velocity = to_vector(dir);
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: false,
            compute_impact_geometry_on_penetration: true,
        };

        let mut closest: Option<HitResult> = None;

        for brush in &self.brushes {
            if !mask.intersects(brush.contents) {
                continue;
            }

            let hit = match brush.as_box() {
                Some(box_brush) => box_brush
                    .sweep(shape, origin, rotation, dir, max_distance)
                    .map(|hit| box_sweep_hit(&hit, brush, dir, max_distance)),
                None => match cast_shapes(
                    &body_pos,
                    &velocity,
                    body.as_shape(),
                    &brush.isometry(),
                    &Vector::zeros(),
                    brush.shape.as_ref(),
                    options,
                ) {
                    Ok(Some(hit)) if hit.time_of_impact <= max_distance => {
                        Some(self.sweep_hit(&hit, brush, &body, &body_pos, dir, max_distance))
                    }
                    _ => None,
                },
            };

            if let Some(hit) = hit {
                if closest.as_ref().map_or(true, |best| hit.distance < best.distance) {
                    closest = Some(hit);
                }
            }
        }

        closest.unwrap_or_else(|| HitResult::miss(max_distance))
    }

    /// Perform a raycast (point trace) through the world.
    ///
    /// # Arguments
    ///
    /// * `origin` - Ray starting position
    /// * `direction` - Ray direction (will be normalized)
    /// * `max_distance` - Maximum trace distance
    /// * `mask` - Content flags to collide with
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: ContentFlags) -> HitResult {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() < 0.5 || max_distance <= 0.0 {
            return HitResult::miss(max_distance.max(0.0));
        }

        let ray = Ray::new(to_point(origin), to_vector(dir));

        let mut closest_hit: Option<(f32, Vec3, &CollisionBrush)> = None;

        for brush in &self.brushes {
            if !mask.intersects(brush.contents) {
                continue;
            }

            let transform = brush.isometry();
            if let Some(intersection) = brush
                .shape
                .cast_ray_and_get_normal(&transform, &ray, max_distance, true)
            {
                let toi = intersection.time_of_impact;
                let is_closer = closest_hit.as_ref().map_or(true, |(dist, _, _)| toi < *dist);
                if is_closer {
                    let normal = from_vector(&intersection.normal).normalize_or_zero();
                    closest_hit = Some((toi, normal, brush));
                }
            }
        }

        match closest_hit {
            Some((distance, normal, brush)) => {
                let point = origin + dir * distance;
                let mut result = HitResult::blocking(distance, max_distance, point, normal, normal, Some(brush.id));
                // Rays starting inside a solid report no normal
                result.start_penetrating = normal == Vec3::ZERO;
                result
            }
            None => HitResult::miss(max_distance),
        }
    }

    /// Check if a body shape placed at `position` is inside solid geometry.
    pub fn overlaps_at(&self, shape: &BodyShape, position: Vec3, rotation: Quat, mask: ContentFlags) -> bool {
        let body = ParryBody::new(shape);
        let body_pos = body_isometry(shape, position, rotation);

        self.brushes
            .iter()
            .filter(|brush| mask.intersects(brush.contents))
            .any(|brush| match brush.as_box() {
                Some(box_brush) => box_brush.separation(shape, position, rotation).distance < 0.0,
                None => matches!(
                    contact(&body_pos, body.as_shape(), &brush.isometry(), brush.shape.as_ref(), 0.0),
                    Ok(Some(c)) if c.dist < 0.0
                ),
            })
    }

    /// Find the deepest overlap between a body shape and the world.
    pub fn deepest_penetration(
        &self,
        shape: &BodyShape,
        position: Vec3,
        rotation: Quat,
        mask: ContentFlags,
    ) -> Option<Penetration> {
        let body = ParryBody::new(shape);
        let body_pos = body_isometry(shape, position, rotation);

        let mut deepest: Option<Penetration> = None;

        for brush in &self.brushes {
            if !mask.intersects(brush.contents) {
                continue;
            }

            // Negative separation means penetration
            let (depth, direction) = match brush.as_box() {
                Some(box_brush) => {
                    let separation = box_brush.separation(shape, position, rotation);
                    (-separation.distance, separation.normal)
                }
                None => match contact(&body_pos, body.as_shape(), &brush.isometry(), brush.shape.as_ref(), 0.0) {
                    Ok(Some(c)) => (-c.dist, from_vector(&c.normal2.into_inner()).normalize_or_zero()),
                    _ => continue,
                },
            };
            if depth <= 0.0 || direction == Vec3::ZERO {
                continue;
            }
            if deepest.map_or(true, |d| depth > d.depth) {
                deepest = Some(Penetration {
                    direction,
                    depth,
                    object: Some(brush.id),
                });
            }
        }

        deepest
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn push_brush(
        &mut self,
        shape: SharedShape,
        position: Vec3,
        rotation: Quat,
        contents: ContentFlags,
        motion: Option<BrushMotion>,
    ) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;

        self.brushes.push(CollisionBrush {
            id,
            shape,
            position,
            rotation,
            contents,
            motion,
        });

        id
    }

    fn brush_mut(&mut self, id: ObjectId) -> Result<&mut CollisionBrush, WorldError> {
        self.brushes
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(WorldError::UnknownBrush(id))
    }

    /// Convert a parry shape-cast hit into a [`HitResult`].
    fn sweep_hit(
        &self,
        hit: &ShapeCastHit,
        brush: &CollisionBrush,
        body: &ParryBody,
        body_pos: &Isometry<Real>,
        direction: Vec3,
        max_distance: f32,
    ) -> HitResult {
        let brush_pos = brush.isometry();
        let impact_point = from_point(&(brush_pos * hit.witness2));

        if hit.status == ShapeCastStatus::PenetratingOrWithinTargetDist {
            // Witness normals are unreliable when the cast starts inside;
            // ask for the contact instead.
            let normal = contact(body_pos, body.as_shape(), &brush_pos, brush.shape.as_ref(), 0.0)
                .ok()
                .flatten()
                .map(|c| from_vector(&c.normal2.into_inner()).normalize_or_zero())
                .filter(|n| *n != Vec3::ZERO)
                .unwrap_or(-direction);

            let mut result = HitResult::blocking(0.0, max_distance, impact_point, normal, normal, Some(brush.id));
            result.start_penetrating = true;
            return result;
        }

        let mut normal = from_vector(&(brush_pos.rotation * hit.normal2.into_inner())).normalize_or_zero();
        if normal == Vec3::ZERO {
            normal = -direction;
        }
        let impact_normal = face_normal(brush, &brush_pos, impact_point, direction, normal);

        HitResult::blocking(
            hit.time_of_impact,
            max_distance,
            impact_point,
            impact_normal,
            normal,
            Some(brush.id),
        )
    }
}

impl CollisionQuery for CollisionWorld {
    fn sweep_shape(
        &self,
        shape: &BodyShape,
        origin: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
    ) -> HitResult {
        self.sweep(shape, origin, rotation, direction, max_distance, ContentFlags::MASK_BODY_SOLID)
    }

    fn line_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> HitResult {
        self.raycast(origin, direction, max_distance, ContentFlags::MASK_BODY_SOLID)
    }

    fn overlaps(&self, shape: &BodyShape, position: Vec3, rotation: Quat) -> bool {
        self.overlaps_at(shape, position, rotation, ContentFlags::MASK_BODY_SOLID)
    }

    fn penetration(&self, shape: &BodyShape, position: Vec3, rotation: Quat) -> Option<Penetration> {
        self.deepest_penetration(shape, position, rotation, ContentFlags::MASK_BODY_SOLID)
    }

    fn base_motion(&self, object: ObjectId) -> Option<BaseMotion> {
        let brush = self.brush(object)?;
        let motion = brush.motion?;
        Some(BaseMotion {
            simulates_physics: motion.simulates_physics,
            physics_velocity: if motion.simulates_physics { motion.velocity } else { Vec3::ZERO },
            owner_velocity: motion.velocity,
            angular_velocity: motion.angular_velocity,
            center_of_mass: brush.position,
        })
    }
}

/// Parry shape for a body, built on the stack for each query.
enum ParryBody {
    Capsule(Capsule),
    Cuboid(Cuboid),
}

impl ParryBody {
    fn new(shape: &BodyShape) -> Self {
        match *shape {
            BodyShape::Capsule { radius, height } => {
                // Parry capsule is defined by half-height of the cylinder part
                let cylinder_half_height = (height - 2.0 * radius).max(0.0) / 2.0;
                Self::Capsule(Capsule::new_y(cylinder_half_height, radius))
            }
            BodyShape::Box { half_extents } => Self::Cuboid(Cuboid::new(to_vector(half_extents))),
        }
    }

    fn as_shape(&self) -> &dyn Shape {
        match self {
            Self::Capsule(capsule) => capsule,
            Self::Cuboid(cuboid) => cuboid,
        }
    }
}

/// Convert a closed-form box sweep into a [`HitResult`].
fn box_sweep_hit(hit: &BoxSweep, brush: &CollisionBrush, direction: Vec3, max_distance: f32) -> HitResult {
    let separation = hit.separation;
    let normal = if separation.normal == Vec3::ZERO {
        -direction
    } else {
        separation.normal
    };

    if hit.start_penetrating {
        let mut result = HitResult::blocking(0.0, max_distance, separation.point, normal, normal, Some(brush.id));
        result.start_penetrating = true;
        return result;
    }

    let impact_normal = face_normal(brush, &brush.isometry(), separation.point, direction, normal);
    HitResult::blocking(
        hit.distance,
        max_distance,
        separation.point,
        impact_normal,
        normal,
        Some(brush.id),
    )
}

/// Whether `points` contain four corners of a tetrahedron with real volume.
fn spans_volume(points: &[Vec3]) -> bool {
    let Some((&first, rest)) = points.split_first() else {
        return false;
    };
    let Some(&far) = rest.iter().max_by(|a, b| a.distance_squared(first).total_cmp(&b.distance_squared(first))) else {
        return false;
    };
    let edge = far - first;
    let Some(normal) = points
        .iter()
        .map(|p| edge.cross(*p - first))
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
    else {
        return false;
    };
    points
        .iter()
        .any(|p| normal.dot(*p - first).abs() / 6.0 > MIN_HULL_VOLUME)
}

/// Surface normal of `brush` at `point`, picking the face most opposed to
/// `direction` when the point sits on an edge or corner.
fn face_normal(
    brush: &CollisionBrush,
    brush_pos: &Isometry<Real>,
    point: Vec3,
    direction: Vec3,
    fallback: Vec3,
) -> Vec3 {
    if let Some(cuboid) = brush.shape.as_cuboid() {
        let local = brush_pos.inverse_transform_point(&to_point(point));
        let half_extents = cuboid.half_extents;
        let mut best: Option<(f32, Vec3)> = None;

        for axis in 0..3 {
            for sign in [-1.0_f32, 1.0] {
                if (local[axis] - sign * half_extents[axis]).abs() > FACE_TOLERANCE {
                    continue;
                }
                let mut local_normal = Vector::zeros();
                local_normal[axis] = sign;
                let normal = from_vector(&(brush_pos.rotation * local_normal));
                let opposition = normal.dot(direction);
                if best.map_or(true, |(b, _)| opposition < b) {
                    best = Some((opposition, normal));
                }
            }
        }

        if let Some((_, normal)) = best {
            return normal;
        }
    }

    let ray = Ray::new(to_point(point - direction * FACE_PROBE_DISTANCE), to_vector(direction));
    if let Some(intersection) =
        brush
            .shape
            .cast_ray_and_get_normal(brush_pos, &ray, FACE_PROBE_DISTANCE * 2.0, true)
    {
        let normal = from_vector(&intersection.normal).normalize_or_zero();
        if normal.dot(direction) < 0.0 {
            return normal;
        }
    }

    fallback
}

/// Isometry of a body shape whose bottom-center sits at `position`.
fn body_isometry(shape: &BodyShape, position: Vec3, rotation: Quat) -> Isometry<Real> {
    let center = position + rotation * (Vec3::Y * shape.half_height());
    isometry(center, rotation)
}

fn isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let axis = rotation.to_scaled_axis();
    Isometry::new(to_vector(position), to_vector(axis))
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
fn from_point(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor at y=0
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            ContentFlags::SOLID,
        );

        // Wall at x=10
        world.add_box(
            Vec3::new(10.0, 2.5, 0.0),
            Vec3::new(0.5, 2.5, 10.0),
            ContentFlags::SOLID,
        );

        world
    }

    fn capsule() -> BodyShape {
        BodyShape::capsule(0.5, 2.0)
    }

    #[test]
    fn test_raycast_hit() {
        let world = create_test_world();

        let result = world.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 100.0, ContentFlags::SOLID);

        assert!(result.blocked);
        assert!(result.time < 1.0);
        // Should hit wall at approximately x=9.5
        assert!((result.impact_point.x - 9.5).abs() < 0.01);
        assert!((result.impact_normal - Vec3::NEG_X).length() < 1e-3);
        assert_eq!(result.object, Some(1));
    }

    #[test]
    fn test_raycast_miss() {
        let world = create_test_world();

        let result = world.raycast(Vec3::new(0.0, 1.0, 0.0), -Vec3::X, 100.0, ContentFlags::SOLID);

        // Should not hit anything going -X
        assert!(!result.blocked);
        assert_eq!(result.time, 1.0);
    }

    #[test]
    fn test_sweep_capsule_into_wall() {
        let world = create_test_world();

        let result = world.sweep_shape(&capsule(), Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY, Vec3::X, 15.0);

        assert!(result.is_valid_blocking_hit());
        // Capsule surface reaches the wall face at x=9.5 when its axis is at x=9.0
        assert!((result.distance - 9.0).abs() < 0.01, "distance={}", result.distance);
        assert!((result.normal - Vec3::NEG_X).length() < 1e-3, "normal={:?}", result.normal);
        assert!((result.impact_normal - Vec3::NEG_X).length() < 1e-3);
    }

    #[test]
    fn test_sweep_down_onto_floor() {
        let world = create_test_world();

        let result = world.sweep_shape(&capsule(), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::NEG_Y, 5.0);

        assert!(result.is_valid_blocking_hit());
        assert!((result.distance - 1.0).abs() < 0.01, "distance={}", result.distance);
        assert!((result.impact_normal - Vec3::Y).length() < 1e-3);
        assert!(result.impact_point.y.abs() < 0.01);
    }

    #[test]
    fn test_sweep_box_edge_reads_face_normal() {
        let mut world = CollisionWorld::new();
        // Low step with its top at y=0.3 and near face at x=1.5
        world.add_box(Vec3::new(2.0, 0.15, 0.0), Vec3::new(0.5, 0.15, 2.0), ContentFlags::SOLID);

        let result = world.sweep_shape(&capsule(), Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY, Vec3::X, 3.0);

        assert!(result.is_valid_blocking_hit());
        assert!((result.impact_point.y - 0.3).abs() < 0.01, "impact={:?}", result.impact_point);
        assert!(
            (result.impact_normal - Vec3::NEG_X).length() < 1e-3,
            "edge hit should read the step riser, got {:?}",
            result.impact_normal
        );
        assert!(result.normal.y > 0.1, "contact normal leans toward the capsule center");
    }

    #[test]
    fn test_sweep_miss() {
        let world = create_test_world();

        let result = world.sweep_shape(&capsule(), Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY, Vec3::NEG_X, 5.0);

        assert!(!result.blocked);
        assert_eq!(result.distance, 5.0);
    }

    #[test]
    fn test_overlap_and_penetration() {
        let world = create_test_world();
        let shape = capsule();

        assert!(!world.overlaps(&shape, Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY));

        // Sunk 0.2 into the floor
        let sunk = Vec3::new(0.0, -0.2, 0.0);
        assert!(world.overlaps(&shape, sunk, Quat::IDENTITY));

        let penetration = world
            .penetration(&shape, sunk, Quat::IDENTITY)
            .expect("should report penetration");
        assert!((penetration.direction - Vec3::Y).length() < 1e-3);
        assert!((penetration.depth - 0.2).abs() < 0.01, "depth={}", penetration.depth);
        assert_eq!(penetration.object, Some(0));
    }

    #[test]
    fn test_floor_penetration_depth_is_exact() {
        let world = create_test_world();
        let shape = capsule();

        // Shallow, mid-cap and core-deep overlaps with the large floor box
        for sink in [0.05_f32, 0.2, 0.5] {
            let position = Vec3::new(1.0, -sink, -2.0);
            assert!(world.overlaps(&shape, position, Quat::IDENTITY), "sink {} not detected", sink);

            let penetration = world
                .penetration(&shape, position, Quat::IDENTITY)
                .expect("should report penetration");
            assert!((penetration.direction - Vec3::Y).length() < 1e-4, "sink {}", sink);
            assert!(
                (penetration.depth - sink).abs() < 1e-4,
                "sink {} reported depth {}",
                sink,
                penetration.depth
            );
        }
    }

    #[test]
    fn test_floor_sweep_distance_is_exact() {
        let world = create_test_world();
        let shape = capsule();

        for height in [0.011_f32, 0.0115, 0.05, 0.1] {
            let origin = Vec3::new(0.5, height, 0.5);
            let result = world.sweep_shape(&shape, origin + Vec3::Y * 0.1, Quat::IDENTITY, Vec3::NEG_Y, 0.6);

            assert!(result.is_valid_blocking_hit());
            assert!(
                (result.distance - (height + 0.1)).abs() < 1e-4,
                "clearance {} swept {}",
                height,
                result.distance
            );
        }
    }

    #[test]
    fn test_box_body_sweeps_onto_floor() {
        let world = create_test_world();
        let shape = BodyShape::Box {
            half_extents: Vec3::new(0.4, 0.5, 0.4),
        };

        let result = world.sweep_shape(&shape, Vec3::new(0.0, 0.7, 0.0), Quat::IDENTITY, Vec3::NEG_Y, 2.0);

        assert!(result.is_valid_blocking_hit());
        assert!((result.distance - 0.7).abs() < 1e-4, "distance={}", result.distance);
        assert!((result.impact_normal - Vec3::Y).length() < 1e-3);
        assert!(result.impact_point.y.abs() < 1e-4);
    }

    #[test]
    fn test_hull_brush_blocks_sweeps() {
        let mut world = CollisionWorld::new();
        let wedge = world
            .add_convex_hull(
                &[
                    Vec3::new(2.0, 0.0, -1.0),
                    Vec3::new(2.0, 0.0, 1.0),
                    Vec3::new(4.0, 0.0, -1.0),
                    Vec3::new(4.0, 0.0, 1.0),
                    Vec3::new(4.0, 1.0, -1.0),
                    Vec3::new(4.0, 1.0, 1.0),
                ],
                ContentFlags::SOLID,
            )
            .expect("wedge has volume");

        let result = world.sweep_shape(&capsule(), Vec3::new(0.0, 0.01, 0.0), Quat::IDENTITY, Vec3::X, 5.0);

        assert!(result.is_valid_blocking_hit());
        assert_eq!(result.object, Some(wedge));
        assert!(result.distance < 2.0, "distance={}", result.distance);
    }

    #[test]
    fn test_content_mask_filtering() {
        let mut world = CollisionWorld::new();

        // Add solid wall
        world.add_box(Vec3::new(5.0, 1.0, 0.0), Vec3::new(0.5, 1.0, 5.0), ContentFlags::SOLID);

        // Add sensor (non-blocking)
        world.add_box(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.5, 1.0, 5.0), ContentFlags::SENSOR);

        // Queries through the service use the body mask and ignore sensors
        let result = world.line_cast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 100.0);

        assert!(result.blocked);
        // Should hit wall at x=4.5, not sensor at x=2.5
        assert!((result.impact_point.x - 4.5).abs() < 0.01);
    }

    #[test]
    fn test_moving_brush_advances_and_reports_motion() {
        let mut world = CollisionWorld::new();
        let platform = world.add_moving_box(
            Vec3::new(0.0, -0.25, 0.0),
            Vec3::new(2.0, 0.25, 2.0),
            BrushMotion {
                velocity: Vec3::new(1.0, 0.0, 0.0),
                ..Default::default()
            },
        );

        world.advance(0.5);

        let brush = world.brush(platform).expect("platform exists");
        assert!((brush.position.x - 0.5).abs() < 1e-6);

        let motion = world.base_motion(platform).expect("moving brushes are bases");
        assert_eq!(motion.linear_velocity(), Vec3::X);
        assert!(!motion.simulates_physics);
    }

    #[test]
    fn test_static_brush_is_not_a_base() {
        let world = create_test_world();
        assert!(world.base_motion(0).is_none());
    }

    #[test]
    fn test_degenerate_hull_is_an_error() {
        let mut world = CollisionWorld::new();
        let result = world.add_convex_hull(&[Vec3::ZERO, Vec3::X], ContentFlags::SOLID);
        assert!(matches!(result, Err(WorldError::DegenerateHull(2))));

        // Too few points for a solid
        let result = world.add_convex_hull(&[Vec3::ZERO, Vec3::X, Vec3::Z], ContentFlags::SOLID);
        assert!(matches!(result, Err(WorldError::DegenerateHull(3))));

        // Enough points, but all on one plane
        let flat = [Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.5, 0.0, 2.0)];
        let result = world.add_convex_hull(&flat, ContentFlags::SOLID);
        assert!(matches!(result, Err(WorldError::DegenerateHull(5))));

        assert_eq!(world.brush_count(), 0);
    }

    #[test]
    fn test_unknown_brush_is_an_error() {
        let mut world = CollisionWorld::new();
        assert!(matches!(world.set_motion(7, None), Err(WorldError::UnknownBrush(7))));
    }
}
