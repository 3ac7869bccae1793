//! Simulation - the fixed-step host loop.
//!
//! This module runs every agent's motor against one scene at a fixed tick
//! rate. Ticks are deterministic, so a snapshot plus the same inputs replays
//! the same frames.

use glam::Quat;
use serde::{Deserialize, Serialize};
use stride_physics::collision::WorldError;
use stride_physics::motor::{CodecError, ConfigError};
use stride_physics::{BodyShape, KinematicMotor, MotorConfig};
use thiserror::Error;

use crate::agent::{Agent, AgentId};
use crate::rules::{AgentInput, RuleConfig, Rules};
use crate::scene::{PlatformPose, Scene};

/// Errors raised by the host loop.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid motor config: {0}")]
    Config(#[from] ConfigError),

    #[error("scene error: {0}")]
    World(#[from] WorldError),

    #[error("snapshot codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("no agent with id {0}")]
    UnknownAgent(AgentId),
}

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Motor configuration shared by every agent.
    pub motor: MotorConfig,

    /// Walking, falling and jumping.
    pub rules: RuleConfig,

    /// Body shape for new agents.
    pub shape: BodyShape,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            motor: MotorConfig::default(),
            rules: RuleConfig::default(),
            shape: BodyShape::HUMANOID,
        }
    }
}

impl SimulationConfig {
    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

/// Everything needed to rewind the simulation to a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub frame: u64,
    /// Encoded motor state per agent.
    pub agents: Vec<(AgentId, Vec<u8>)>,
    pub platforms: Vec<PlatformPose>,
}

/// The host simulation.
///
/// Each tick advances the scene first, then runs rules and motor for every
/// agent in insertion order.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current scene.
    pub scene: Scene,

    /// All agents.
    pub agents: Vec<Agent>,

    rules: Rules,

    /// Next agent ID to assign.
    next_agent_id: AgentId,
}

impl Simulation {
    /// Create a new simulation with the given configuration and scene.
    pub fn new(config: SimulationConfig, scene: Scene) -> Result<Self, SimulationError> {
        config.motor.validate()?;
        let rules = Rules::new(config.rules.clone());

        Ok(Self {
            frame: 0,
            config,
            scene,
            agents: Vec::new(),
            rules,
            next_agent_id: 1,
        })
    }

    /// Create a simulation with default configuration and the test course.
    pub fn test() -> Self {
        Self {
            frame: 0,
            config: SimulationConfig::default(),
            scene: Scene::test_course(),
            agents: Vec::new(),
            rules: Rules::default(),
            next_agent_id: 1,
        }
    }

    /// Add an agent at the next spawn point.
    ///
    /// Returns the agent's ID.
    pub fn add_agent(&mut self, name: &str) -> Result<AgentId, SimulationError> {
        let id = self.next_agent_id;
        self.next_agent_id += 1;

        let spawn_index = self.agents.len() % self.scene.spawn_points.len().max(1);
        let spawn = self.scene.get_spawn(spawn_index).copied().unwrap_or_default();

        let mut motor = KinematicMotor::new(self.config.shape, self.config.motor.clone())?;
        motor.set_rotation(Quat::from_rotation_y(spawn.facing));
        let status = motor.spawn_at(&self.scene.collision, spawn.position);
        log::info!("agent {} ({}) spawned at {:?}: {:?}", id, name, motor.position(), status);

        self.agents.push(Agent::new(id, name.to_string(), motor));
        Ok(id)
    }

    /// Remove an agent from the simulation.
    pub fn remove_agent(&mut self, agent_id: AgentId) {
        self.agents.retain(|a| a.id != agent_id);
    }

    /// Get an agent by ID.
    pub fn get_agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    /// Get a mutable reference to an agent by ID.
    pub fn get_agent_mut(&mut self, agent_id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == agent_id)
    }

    /// Advance the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Agent inputs indexed by agent position in the `agents` array
    pub fn tick(&mut self, inputs: &[AgentInput]) -> Result<(), SimulationError> {
        let delta_time = self.config.delta_time();

        self.scene.advance(delta_time)?;

        for (i, agent) in self.agents.iter_mut().enumerate() {
            // Missing inputs mean standing still
            let input = inputs.get(i).cloned().unwrap_or_default();

            self.rules.apply(&mut agent.motor, &input, delta_time);
            let report = agent.motor.update(&self.scene.collision, delta_time);

            if report.stuck_in_geometry {
                log::warn!("agent {} stuck at {:?}", agent.id, report.position);
            }
            agent.record(report);
        }

        self.frame += 1;
        Ok(())
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }

    // ========================================================================
    // Rollback
    // ========================================================================

    /// Capture the current frame.
    pub fn snapshot(&self) -> Result<SimulationSnapshot, SimulationError> {
        let agents = self
            .agents
            .iter()
            .map(|agent| Ok((agent.id, agent.snapshot()?)))
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(SimulationSnapshot {
            frame: self.frame,
            agents,
            platforms: self.scene.platform_poses(),
        })
    }

    /// Rewind to a captured frame.
    ///
    /// Agents added after the capture keep their current state.
    pub fn restore(&mut self, snapshot: &SimulationSnapshot) -> Result<(), SimulationError> {
        for (id, data) in &snapshot.agents {
            let agent = self.get_agent_mut(*id).ok_or(SimulationError::UnknownAgent(*id))?;
            agent.restore(data)?;
        }
        self.scene.restore_platforms(&snapshot.platforms)?;

        log::debug!("rolled back from frame {} to {}", self.frame, snapshot.frame);
        self.frame = snapshot.frame;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MovementInput;
    use glam::Vec3;
    use stride_physics::GroundingStatus;

    fn forward() -> AgentInput {
        AgentInput {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn scripted_inputs(count: usize) -> Vec<AgentInput> {
        (0..count)
            .map(|i| AgentInput {
                movement: MovementInput {
                    forward: i % 2 == 0,
                    right: i % 3 == 0,
                    ..Default::default()
                },
                jump: i % 40 == 0,
                turn: if i % 25 == 0 { 0.1 } else { 0.0 },
                frame: i as u32,
            })
            .collect()
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::test();
        assert_eq!(sim.frame, 0);
        assert!(sim.agents.is_empty());
    }

    #[test]
    fn test_invalid_motor_config_rejected() {
        let config = SimulationConfig {
            motor: MotorConfig {
                max_movement_iterations: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = Simulation::new(config, Scene::test_course());

        assert!(matches!(result, Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_add_agent() {
        let mut sim = Simulation::test();

        let id = sim.add_agent("Agent1").unwrap();
        assert!(id > 0);
        assert_eq!(sim.agents.len(), 1);

        let agent = sim.get_agent(id).unwrap();
        assert_eq!(agent.name, "Agent1");
        assert!(agent.on_ground(), "spawn should snap to the floor");
    }

    #[test]
    fn test_tick_advances_frame() {
        let mut sim = Simulation::test();
        sim.add_agent("Test").unwrap();

        sim.tick(&[AgentInput::default()]).unwrap();
        assert_eq!(sim.frame, 1);

        sim.tick(&[AgentInput::default()]).unwrap();
        assert_eq!(sim.frame, 2);
    }

    #[test]
    fn test_movement_input() {
        let mut sim = Simulation::test();
        let id = sim.add_agent("Test").unwrap();

        let start_pos = sim.get_agent(id).unwrap().position();

        for _ in 0..60 {
            sim.tick(&[forward()]).unwrap();
        }

        let agent = sim.get_agent(id).unwrap();
        let distance = (agent.position() - start_pos).length();
        assert!(distance > 4.0, "Agent should have moved, distance={}", distance);
        assert!(agent.on_ground());
        assert!(agent.position().y.abs() < 0.05, "stays on the floor, got {:?}", agent.position());
    }

    #[test]
    fn test_jump_and_land() {
        let mut sim = Simulation::test();
        let id = sim.add_agent("Test").unwrap();

        let jump = AgentInput {
            jump: true,
            ..Default::default()
        };
        sim.tick(&[jump]).unwrap();
        assert_eq!(sim.get_agent(id).unwrap().status(), GroundingStatus::Airborne);

        let mut peak: f32 = 0.0;
        for _ in 0..120 {
            sim.tick(&[AgentInput::default()]).unwrap();
            peak = peak.max(sim.get_agent(id).unwrap().position().y);
        }

        let agent = sim.get_agent(id).unwrap();
        assert!(peak > 0.5, "jump should rise, peak={}", peak);
        assert!(agent.on_ground(), "should land again");
        assert_eq!(agent.landings, 1);
    }

    #[test]
    fn test_determinism() {
        // Run simulation twice with same inputs - should get same results
        let inputs = scripted_inputs(200);

        let mut sim1 = Simulation::test();
        sim1.add_agent("Test").unwrap();
        for input in &inputs {
            sim1.tick(&[input.clone()]).unwrap();
        }

        let mut sim2 = Simulation::test();
        sim2.add_agent("Test").unwrap();
        for input in &inputs {
            sim2.tick(&[input.clone()]).unwrap();
        }

        let state1 = sim1.get_agent(1).unwrap().capture();
        let state2 = sim2.get_agent(1).unwrap().capture();
        assert_eq!(state1, state2, "Simulations should be deterministic");
    }

    #[test]
    fn test_rollback_replays_identically() {
        let inputs = scripted_inputs(120);
        let mut sim = Simulation::test();
        sim.add_agent("A").unwrap();
        sim.add_agent("B").unwrap();

        for input in &inputs[..60] {
            sim.tick(&[input.clone(), forward()]).unwrap();
        }
        let snapshot = sim.snapshot().unwrap();

        let mut first_run = Vec::new();
        for input in &inputs[60..] {
            sim.tick(&[input.clone(), forward()]).unwrap();
            first_run.push(sim.agents.iter().map(Agent::capture).collect::<Vec<_>>());
        }

        sim.restore(&snapshot).unwrap();
        assert_eq!(sim.frame, 60);

        for (frame, input) in inputs[60..].iter().enumerate() {
            sim.tick(&[input.clone(), forward()]).unwrap();
            let states: Vec<_> = sim.agents.iter().map(Agent::capture).collect();
            assert_eq!(states, first_run[frame], "replay diverged at frame {}", 60 + frame);
        }
    }

    #[test]
    fn test_restore_unknown_agent() {
        let mut sim = Simulation::test();
        sim.add_agent("Test").unwrap();
        let snapshot = sim.snapshot().unwrap();

        sim.remove_agent(1);

        assert!(matches!(sim.restore(&snapshot), Err(SimulationError::UnknownAgent(1))));
    }

    #[test]
    fn test_agent_rides_platform() {
        let mut sim = Simulation::test();
        let platform = sim.scene.platforms[0];
        let start = sim.scene.collision.brush(platform.brush).unwrap().position;
        sim.scene.spawn_points.insert(
            0,
            crate::scene::SpawnPoint {
                position: start + Vec3::new(0.0, 0.3, 0.0),
                facing: 0.0,
            },
        );
        let id = sim.add_agent("Rider").unwrap();
        assert_eq!(sim.get_agent(id).unwrap().motor.base().object, Some(platform.brush));

        for _ in 0..60 {
            sim.tick(&[AgentInput::default()]).unwrap();
        }

        let agent = sim.get_agent(id).unwrap();
        assert!(agent.on_ground());
        assert!(
            (agent.position().x - (start.x + 1.0)).abs() < 0.1,
            "carried about 1m, got {:?}",
            agent.position()
        );
    }
}
