//! Stride Physics
//!
//! A kinematic character motor built on discrete collision queries. Bodies
//! are swept through the world rather than simulated, so movement is
//! deterministic and every tick does a bounded amount of work.
//!
//! # Architecture
//!
//! The crate is split into two main systems:
//!
//! - **Collision**: sweeps capsules/boxes and casts rays through the world, returns hit information
//! - **Motor**: uses those queries to ground, slide, step and carry a body each tick
//!
//! # Design Principles
//!
//! 1. **Determinism**: Same inputs always produce same outputs
//! 2. **Bounded work**: Every loop has a fixed iteration cap
//! 3. **No faults**: Bad states are reported as status, never as errors mid-tick

pub mod collision;
pub mod motor;

// Re-export commonly used types
pub use collision::{BodyShape, CollisionQuery, CollisionWorld, ContentFlags, HitResult, ObjectId};
pub use motor::{
    ControlledBody, GroundingReport, GroundingStatus, KinematicMotor, MotorConfig, MotorEvent, MotorState,
    RootMotionSample, TickReport,
};
