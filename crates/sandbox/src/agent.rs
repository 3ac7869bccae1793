//! Agents: a named motor plus what it reported last tick.

use glam::{Quat, Vec3};
use stride_physics::motor::CodecError;
use stride_physics::{GroundingStatus, KinematicMotor, MotorEvent, MotorState, TickReport};

/// Unique identifier for agents.
pub type AgentId = u32;

/// A character moving through the scene.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique agent ID.
    pub id: AgentId,

    /// Agent name/handle.
    pub name: String,

    /// The motor that owns the agent's body.
    pub motor: KinematicMotor,

    /// Report from the most recent tick.
    pub last_report: Option<TickReport>,

    /// Number of times the agent has landed.
    pub landings: u32,
}

impl Agent {
    /// Create a new agent around an already spawned motor.
    pub fn new(id: AgentId, name: String, motor: KinematicMotor) -> Self {
        Self {
            id,
            name,
            motor,
            last_report: None,
            landings: 0,
        }
    }

    /// Get the agent's current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.motor.position()
    }

    /// Get the agent's facing.
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.motor.rotation()
    }

    #[inline]
    pub fn status(&self) -> GroundingStatus {
        self.motor.status()
    }

    /// Check if the agent stands on stable ground.
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.status() == GroundingStatus::Grounded
    }

    /// Store a tick's report and count its landings.
    pub fn record(&mut self, report: TickReport) {
        self.landings += report
            .events
            .iter()
            .filter(|event| matches!(event, MotorEvent::Landed { .. }))
            .count() as u32;
        self.last_report = Some(report);
    }

    /// Capture the motor state.
    pub fn capture(&self) -> MotorState {
        self.motor.capture_state()
    }

    /// Encode the motor state for a rollback buffer.
    pub fn snapshot(&self) -> Result<Vec<u8>, CodecError> {
        self.motor.capture_state().encode()
    }

    /// Restore the motor from bytes written by [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, data: &[u8]) -> Result<(), CodecError> {
        let state = MotorState::decode(data)?;
        self.motor.apply_state(&state);
        self.last_report = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_physics::{BodyShape, CollisionWorld, ContentFlags};

    fn agent_on_floor() -> (CollisionWorld, Agent) {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0), ContentFlags::SOLID);
        let mut motor = KinematicMotor::with_default_config(BodyShape::HUMANOID);
        motor.spawn_at(&world, Vec3::new(0.0, 0.5, 0.0));
        (world, Agent::new(1, "Test".to_string(), motor))
    }

    #[test]
    fn test_agent_creation() {
        let (_, agent) = agent_on_floor();

        assert!(agent.on_ground());
        assert!(agent.last_report.is_none());
        assert!(agent.position().y < 0.1, "snapped to floor, got {:?}", agent.position());
    }

    #[test]
    fn test_snapshot_restore() {
        let (world, mut agent) = agent_on_floor();
        let saved = agent.snapshot().unwrap();
        let before = agent.capture();

        agent.motor.set_velocity(Vec3::new(3.0, 0.0, 0.0));
        for _ in 0..30 {
            let report = agent.motor.update(&world, 1.0 / 60.0);
            agent.record(report);
        }
        assert!(agent.position().x > 1.0);

        agent.restore(&saved).unwrap();

        assert_eq!(agent.capture(), before);
        assert!(agent.last_report.is_none());
    }

    #[test]
    fn test_restore_garbage_fails() {
        let (_, mut agent) = agent_on_floor();

        assert!(agent.restore(&[0xff, 0xff]).is_err());
    }
}
