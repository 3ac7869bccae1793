//! Scene layout: collision geometry, spawn points and moving platforms.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use stride_physics::collision::{BrushMotion, WorldError};
use stride_physics::{CollisionWorld, ContentFlags, ObjectId};

/// A scene containing collision geometry and spawn points.
#[derive(Debug)]
pub struct Scene {
    /// Scene identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world the motors move through.
    pub collision: CollisionWorld,

    /// Agent spawn points.
    pub spawn_points: Vec<SpawnPoint>,

    /// Platforms that shuttle between two points.
    pub platforms: Vec<PlatformRoute>,
}

/// A spawn point for agents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Position in world space (bottom of the body).
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

/// A platform brush travelling back and forth between `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformRoute {
    pub brush: ObjectId,
    pub start: Vec3,
    pub end: Vec3,
    /// Travel speed (meters/second).
    pub speed: f32,
}

/// Pose and motion of a platform at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformPose {
    pub brush: ObjectId,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: CollisionWorld::new(),
            spawn_points: Vec::new(),
            platforms: Vec::new(),
        }
    }

    /// A walled yard with one of each obstacle the motor handles.
    ///
    /// ```text
    ///            +z
    ///   crease        platform      ramp
    ///   corner        (shuttles x)
    ///                   spawn
    ///   ledge                       steps
    ///            -z
    /// ```
    pub fn test_course() -> Self {
        let mut scene = Self::new("test_course", "Test Course");
        let world = &mut scene.collision;

        // Floor, top at y = 0
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(20.0, 0.5, 20.0),
            ContentFlags::SOLID,
        );

        // Boundary walls
        let wall_height = 3.0;
        let wall_thickness = 0.5;
        let yard_size = 20.0;
        for (center, half_extents) in [
            (Vec3::new(0.0, 0.0, -yard_size), Vec3::new(yard_size, 0.0, wall_thickness)),
            (Vec3::new(0.0, 0.0, yard_size), Vec3::new(yard_size, 0.0, wall_thickness)),
            (Vec3::new(-yard_size, 0.0, 0.0), Vec3::new(wall_thickness, 0.0, yard_size)),
            (Vec3::new(yard_size, 0.0, 0.0), Vec3::new(wall_thickness, 0.0, yard_size)),
        ] {
            world.add_box(
                center + Vec3::Y * (wall_height / 2.0),
                half_extents + Vec3::Y * (wall_height / 2.0),
                ContentFlags::SOLID,
            );
        }

        // Steps: one climbable, one too tall
        world.add_box(Vec3::new(6.0, 0.15, -6.0), Vec3::new(1.0, 0.15, 2.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(10.0, 0.4, -6.0), Vec3::new(1.0, 0.4, 2.0), ContentFlags::SOLID);

        // Ramp, 20 degrees
        world.add_oriented_box(
            Vec3::new(8.0, 0.0, 8.0),
            Vec3::new(3.0, 0.2, 2.0),
            Quat::from_rotation_z(20f32.to_radians()),
            ContentFlags::SOLID,
        );

        // Ledge: raised block, top at y = 2
        world.add_box(Vec3::new(-8.0, 1.0, -8.0), Vec3::new(3.0, 1.0, 3.0), ContentFlags::SOLID);

        // Crease: two walls meeting at a right angle
        world.add_box(Vec3::new(-12.0, 1.5, 12.0), Vec3::new(0.25, 1.5, 3.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(-15.0, 1.5, 15.0), Vec3::new(3.0, 1.5, 0.25), ContentFlags::SOLID);

        // Shuttle platform, top at y = 1
        scene.add_platform(
            Vec3::new(-3.0, 0.75, 12.0),
            Vec3::new(3.0, 0.75, 12.0),
            Vec3::new(1.5, 0.25, 1.5),
            1.0,
        );

        scene.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.5, 0.0),
            facing: 0.0,
        });
        scene.spawn_points.push(SpawnPoint {
            position: Vec3::new(3.0, 0.5, 3.0),
            facing: std::f32::consts::FRAC_PI_2,
        });

        scene
    }

    /// Add a box platform shuttling from `start` to `end` and back.
    pub fn add_platform(&mut self, start: Vec3, end: Vec3, half_extents: Vec3, speed: f32) -> ObjectId {
        let motion = BrushMotion {
            velocity: (end - start).normalize_or_zero() * speed,
            ..Default::default()
        };
        let brush = self.collision.add_moving_box(start, half_extents, motion);
        self.platforms.push(PlatformRoute {
            brush,
            start,
            end,
            speed,
        });
        brush
    }

    /// Get a spawn point by index.
    pub fn get_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Move the world by one time step, turning platforms around at the ends
    /// of their routes.
    pub fn advance(&mut self, delta_time: f32) -> Result<(), WorldError> {
        self.collision.advance(delta_time);

        for route in &self.platforms {
            let Some(brush) = self.collision.brush(route.brush) else {
                return Err(WorldError::UnknownBrush(route.brush));
            };
            let Some(motion) = brush.motion else {
                continue;
            };

            let span = route.end - route.start;
            let axis = span.normalize_or_zero();
            let travelled = (brush.position - route.start).dot(axis);
            let heading = motion.velocity.dot(axis);

            let reverse = (travelled >= span.length() && heading > 0.0) || (travelled <= 0.0 && heading < 0.0);
            if reverse {
                let motion = BrushMotion {
                    velocity: -motion.velocity,
                    ..motion
                };
                self.collision.set_motion(route.brush, Some(motion))?;
            }
        }

        Ok(())
    }

    /// Capture every platform's pose and motion.
    pub fn platform_poses(&self) -> Vec<PlatformPose> {
        self.platforms
            .iter()
            .filter_map(|route| self.collision.brush(route.brush))
            .map(|brush| PlatformPose {
                brush: brush.id,
                position: brush.position,
                rotation: brush.rotation,
                velocity: brush.motion.map(|m| m.velocity).unwrap_or(Vec3::ZERO),
            })
            .collect()
    }

    /// Put platforms back where a capture found them.
    pub fn restore_platforms(&mut self, poses: &[PlatformPose]) -> Result<(), WorldError> {
        for pose in poses {
            self.collision.set_pose(pose.brush, pose.position, pose.rotation)?;
            let motion = self
                .collision
                .brush(pose.brush)
                .and_then(|b| b.motion)
                .unwrap_or_default();
            self.collision.set_motion(
                pose.brush,
                Some(BrushMotion {
                    velocity: pose.velocity,
                    ..motion
                }),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_physics::BodyShape;

    #[test]
    fn test_course_has_geometry() {
        let scene = Scene::test_course();

        assert!(scene.collision.brush_count() > 5);
        assert_eq!(scene.platforms.len(), 1);
        assert!(scene.get_spawn(0).is_some());
        assert!(scene.get_spawn(10).is_none());
    }

    #[test]
    fn test_spawn_points_are_clear() {
        let scene = Scene::test_course();

        for spawn in &scene.spawn_points {
            assert!(
                !scene.collision.overlaps_at(
                    &BodyShape::HUMANOID,
                    spawn.position,
                    Quat::IDENTITY,
                    ContentFlags::SOLID
                ),
                "spawn at {:?} overlaps geometry",
                spawn.position
            );
        }
    }

    #[test]
    fn test_platform_turns_around() {
        let mut scene = Scene::test_course();
        let route = scene.platforms[0];

        // 6m route at 1 m/s: past the far end after 7 seconds
        for _ in 0..70 {
            scene.advance(0.1).unwrap();
        }

        let brush = scene.collision.brush(route.brush).unwrap();
        let motion = brush.motion.unwrap();
        assert!(motion.velocity.x < 0.0, "should be heading back, got {:?}", motion.velocity);
        assert!(brush.position.x <= route.end.x + 0.2, "overshot to {:?}", brush.position);
    }

    #[test]
    fn test_restore_platforms() {
        let mut scene = Scene::test_course();
        let saved = scene.platform_poses();

        for _ in 0..80 {
            scene.advance(0.1).unwrap();
        }
        assert_ne!(scene.platform_poses(), saved);

        scene.restore_platforms(&saved).unwrap();
        assert_eq!(scene.platform_poses(), saved);
    }
}
