//! Agent input and the gameplay rules that turn it into motor calls.
//!
//! The motor never decides how fast a body walks or how high it jumps. Every
//! tick the rules read an agent's input and its grounding, then feed the motor
//! a velocity, an impulse or an unground request.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use stride_physics::motor::math::{direction_tangent_to_surface, project_on_plane};
use stride_physics::{GroundingStatus, KinematicMotor};

/// Input for one agent for a single tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Jump button pressed.
    pub jump: bool,

    /// Change of facing this tick (radians of yaw).
    pub turn: f32,

    /// Frame number this input was generated.
    pub frame: u32,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl AgentInput {
    /// Planar direction the agent wants to move in, in world space.
    ///
    /// Forward is `-Z` in the agent's frame. Diagonals are normalized.
    pub fn wish_direction(&self, facing: Quat) -> Vec3 {
        let mut forward_move = 0.0;
        let mut right_move = 0.0;

        if self.movement.forward {
            forward_move += 1.0;
        }
        if self.movement.backward {
            forward_move -= 1.0;
        }
        if self.movement.right {
            right_move += 1.0;
        }
        if self.movement.left {
            right_move -= 1.0;
        }

        let local = Vec3::new(right_move, 0.0, -forward_move);
        (facing * local).normalize_or_zero()
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward || self.movement.backward || self.movement.left || self.movement.right
    }
}

/// Tuning for walking, falling and jumping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Gravity acceleration (meters/second^2).
    pub gravity: Vec3,

    /// Ground speed (meters/second).
    pub walk_speed: f32,

    /// How quickly airborne agents steer toward their wish velocity (1/second).
    pub air_control: f32,

    /// Upward speed given by a jump (meters/second).
    pub jump_speed: f32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -20.0, 0.0),
            walk_speed: 5.0,
            air_control: 2.0,
            jump_speed: 6.0,
        }
    }
}

/// Velocity producer driving one motor per agent.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub config: RuleConfig,
}

impl Rules {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Feed `motor` the velocity for this tick.
    ///
    /// Grounded agents walk along the floor and may jump. Everything else
    /// falls under gravity with limited steering.
    pub fn apply(&self, motor: &mut KinematicMotor, input: &AgentInput, delta_time: f32) {
        if input.turn != 0.0 {
            let rotation = Quat::from_rotation_y(input.turn) * motor.rotation();
            motor.set_rotation(rotation);
        }

        let up = motor.body().up();
        let wish = input.wish_direction(motor.rotation()) * self.config.walk_speed;

        match motor.status() {
            GroundingStatus::Grounded => {
                let normal = motor.grounding().ground_normal;
                let velocity = direction_tangent_to_surface(wish, normal, up) * wish.length();
                motor.set_velocity(velocity);

                if input.jump {
                    log::debug!("jump at {:?}", motor.position());
                    motor.force_unground();
                    motor.apply_impulse(up * self.config.jump_speed, true);
                }
            }
            GroundingStatus::Airborne | GroundingStatus::None => {
                let velocity = motor.velocity();
                let vertical = up * velocity.dot(up);
                let mut planar = project_on_plane(velocity, up);

                if input.has_movement() {
                    let blend = (self.config.air_control * delta_time).min(1.0);
                    planar += (wish - planar) * blend;
                }

                motor.set_velocity(planar + vertical + self.config.gravity * delta_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_physics::{BodyShape, CollisionWorld, ContentFlags};

    fn floor() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), ContentFlags::SOLID);
        world
    }

    fn forward() -> AgentInput {
        AgentInput {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut input = forward();
        input.movement.right = true;

        let direction = input.wish_direction(Quat::IDENTITY);

        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.x > 0.0 && direction.z < 0.0, "got {:?}", direction);
    }

    #[test]
    fn test_wish_direction_follows_facing() {
        let direction = forward().wish_direction(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

        assert!((direction - Vec3::NEG_X).length() < 1e-5, "got {:?}", direction);
    }

    #[test]
    fn test_grounded_walk_sets_velocity() {
        let world = floor();
        let mut motor = KinematicMotor::with_default_config(BodyShape::HUMANOID);
        assert_eq!(motor.spawn_at(&world, Vec3::new(0.0, 0.5, 0.0)), GroundingStatus::Grounded);

        Rules::default().apply(&mut motor, &forward(), 1.0 / 60.0);

        assert!(
            (motor.velocity() - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-4,
            "got {:?}",
            motor.velocity()
        );
    }

    #[test]
    fn test_jump_ungrounds() {
        let world = floor();
        let mut motor = KinematicMotor::with_default_config(BodyShape::HUMANOID);
        motor.spawn_at(&world, Vec3::new(0.0, 0.5, 0.0));
        let input = AgentInput {
            jump: true,
            ..Default::default()
        };

        Rules::default().apply(&mut motor, &input, 1.0 / 60.0);

        assert!(motor.must_unground());
        assert!((motor.velocity().y - 6.0).abs() < 1e-5, "got {:?}", motor.velocity());
    }

    #[test]
    fn test_airborne_falls() {
        let world = floor();
        let mut motor = KinematicMotor::with_default_config(BodyShape::HUMANOID);
        assert_eq!(motor.spawn_at(&world, Vec3::new(0.0, 10.0, 0.0)), GroundingStatus::Airborne);

        Rules::default().apply(&mut motor, &AgentInput::default(), 0.1);

        assert!((motor.velocity() - Vec3::new(0.0, -2.0, 0.0)).length() < 1e-5);
    }
}
