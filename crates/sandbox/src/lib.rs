//! Stride Sandbox
//!
//! A small deterministic host for stride motors:
//!
//! - A test course with static obstacles and shuttling platforms
//! - Agents, each owning one motor
//! - Gameplay rules that turn input into velocities, impulses and jumps
//! - Rollback snapshots of the whole simulation
//!
//! # Architecture
//!
//! Every tick the scene moves first, then each agent's rules feed its motor
//! and the motor moves the body through the scene.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Simulation                            │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────────────────────┐ │
//! │  │ Agent   │───►│ Rules    │───►│ KinematicMotor           │ │
//! │  │ Inputs  │    │ (gravity │    │ (ground, slide, step,    │ │
//! │  └─────────┘    │ walk,jump)    │  ride platforms)         │ │
//! │                 └──────────┘    └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod rules;
pub mod scene;
pub mod simulation;

// Re-export main types
pub use agent::{Agent, AgentId};
pub use rules::{AgentInput, MovementInput, RuleConfig, Rules};
pub use scene::{PlatformRoute, Scene, SpawnPoint};
pub use simulation::{Simulation, SimulationConfig, SimulationError, SimulationSnapshot};

// Re-export physics types for convenience
pub use stride_physics::{CollisionWorld, GroundingStatus, KinematicMotor, MotorConfig, TickReport};
