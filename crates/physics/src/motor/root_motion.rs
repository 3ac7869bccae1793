//! Root-motion blending.
//!
//! An animation system can drive the body for a tick by handing the motor a
//! [`RootMotionSample`]. The sample's translation replaces the body velocity
//! and its rotation is applied through the collision-checked rotation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::ControlledBody;
use super::config::MotorConfig;
use super::math::project_on_plane;
use super::{MotionContext, ROOT_MOTION_VELOCITY_TOLERANCE};

/// One tick of animation-driven motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMotionSample {
    /// Translation over the tick, in world space.
    pub translation: Vec3,
    /// Rotation over the tick, applied on top of the body's rotation.
    pub rotation: Quat,
    pub is_active: bool,
    /// Playback position within the clip, in seconds.
    pub sample_time: f32,
    pub clip_length: f32,
    pub blend_in_time: f32,
    pub blend_out_time: f32,
}

impl RootMotionSample {
    /// An active sample in the middle of a clip with no blend windows.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            is_active: true,
            sample_time: 0.5,
            clip_length: 1.0,
            blend_in_time: 0.0,
            blend_out_time: 0.0,
        }
    }

    /// Whether the sample must be ignored this tick.
    pub fn should_discard(&self, config: &MotorConfig) -> bool {
        if !self.is_active || self.sample_time < 0.0 || self.sample_time >= self.clip_length {
            return true;
        }
        if !config.apply_root_motion_during_blend_in && self.sample_time <= self.blend_in_time {
            return true;
        }
        if !config.apply_root_motion_during_blend_out
            && self.sample_time >= self.clip_length - self.blend_out_time
        {
            return true;
        }
        false
    }

    /// Velocity that covers the sample's translation in `delta_time`.
    ///
    /// Tiny components are dropped so idle animations do not creep.
    pub fn velocity(&self, config: &MotorConfig, delta_time: f32) -> Vec3 {
        if delta_time <= 0.0 {
            return Vec3::ZERO;
        }
        let translation = self.translation * config.root_motion_translation_scale;
        let snapped = Vec3::select(
            translation.abs().cmplt(Vec3::splat(ROOT_MOTION_VELOCITY_TOLERANCE)),
            Vec3::ZERO,
            translation,
        );
        snapped / delta_time
    }
}

/// Drive the body from `sample` for this tick.
///
/// Airborne bodies keep falling when the animation has no vertical motion
/// of its own. Returns whether the sample was applied.
pub fn apply(
    ctx: MotionContext<'_>,
    body: &mut ControlledBody,
    sample: &RootMotionSample,
    grounded: bool,
    delta_time: f32,
) -> bool {
    if sample.should_discard(ctx.config) {
        log::trace!("root motion discarded at t={:.3}", sample.sample_time);
        return false;
    }

    let up = body.up();
    let mut velocity = sample.velocity(ctx.config, delta_time);
    if !grounded && velocity.dot(up).abs() <= f32::EPSILON {
        velocity = project_on_plane(velocity, up) + up * body.velocity.dot(up);
    }
    body.velocity = velocity;

    if !sample.rotation.is_near_identity() {
        body.rotate_to(ctx.query, sample.rotation * body.rotation);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::test_scenes;

    #[test]
    fn test_discard_windows() {
        let config = MotorConfig {
            apply_root_motion_during_blend_in: false,
            apply_root_motion_during_blend_out: false,
            ..Default::default()
        };
        let sample = RootMotionSample {
            blend_in_time: 0.2,
            blend_out_time: 0.2,
            ..RootMotionSample::new(Vec3::X, Quat::IDENTITY)
        };

        assert!(!sample.should_discard(&config), "mid-clip is applied");
        assert!(RootMotionSample { is_active: false, ..sample }.should_discard(&config));
        assert!(RootMotionSample { sample_time: -0.1, ..sample }.should_discard(&config));
        assert!(RootMotionSample { sample_time: 1.0, ..sample }.should_discard(&config), "past clip end");
        assert!(RootMotionSample { sample_time: 0.1, ..sample }.should_discard(&config), "blend in");
        assert!(RootMotionSample { sample_time: 0.9, ..sample }.should_discard(&config), "blend out");

        let permissive = MotorConfig::default();
        assert!(!RootMotionSample { sample_time: 0.1, ..sample }.should_discard(&permissive));
        assert!(!RootMotionSample { sample_time: 0.9, ..sample }.should_discard(&permissive));
    }

    #[test]
    fn test_velocity_from_translation() {
        let config = MotorConfig {
            root_motion_translation_scale: 2.0,
            ..Default::default()
        };
        let sample = RootMotionSample::new(Vec3::new(0.05, 0.004, -0.1), Quat::IDENTITY);

        let velocity = sample.velocity(&config, 0.1);

        assert!((velocity - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5, "got {:?}", velocity);
    }

    #[test]
    fn test_airborne_keeps_falling() {
        let world = test_scenes::flat_floor();
        let config = MotorConfig::default();
        let mut body = ControlledBody::new(test_scenes::capsule(), Vec3::new(0.0, 3.0, 0.0));
        body.velocity = Vec3::new(0.0, -4.0, 0.0);
        let sample = RootMotionSample::new(Vec3::new(0.1, 0.0, 0.0), Quat::IDENTITY);

        assert!(apply(MotionContext::new(&world, &config), &mut body, &sample, false, 0.1));

        assert!((body.velocity - Vec3::new(1.0, -4.0, 0.0)).length() < 1e-5, "got {:?}", body.velocity);
    }

    #[test]
    fn test_grounded_uses_sample_only() {
        let world = test_scenes::flat_floor();
        let config = MotorConfig::default();
        let mut body = ControlledBody::new(test_scenes::capsule(), Vec3::new(0.0, 0.01, 0.0));
        body.velocity = Vec3::new(3.0, 0.0, 3.0);
        let turn = Quat::from_rotation_y(0.3);
        let sample = RootMotionSample::new(Vec3::new(0.0, 0.0, 0.2), turn);

        assert!(apply(MotionContext::new(&world, &config), &mut body, &sample, true, 0.1));

        assert!((body.velocity - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
        assert!(body.rotation.angle_between(turn) < 1e-4, "rotation applied");
    }

    #[test]
    fn test_discarded_sample_changes_nothing() {
        let world = test_scenes::flat_floor();
        let config = MotorConfig::default();
        let mut body = ControlledBody::new(test_scenes::capsule(), Vec3::new(0.0, 0.01, 0.0));
        body.velocity = Vec3::X;
        let sample = RootMotionSample {
            is_active: false,
            ..RootMotionSample::new(Vec3::new(0.0, 0.0, 0.2), Quat::from_rotation_y(0.3))
        };

        assert!(!apply(MotionContext::new(&world, &config), &mut body, &sample, true, 0.1));
        assert_eq!(body.velocity, Vec3::X);
        assert_eq!(body.rotation, Quat::IDENTITY);
    }
}
