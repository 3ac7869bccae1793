//! Stride - Main Entry Point
//!
//! Runs the sandbox test course headless: two scripted agents walk, jump and
//! ride the platform while their status is logged once per second.
//!
//! Usage: `stride [ticks]` (default 600). Set `RUST_LOG=debug` for per-event
//! output.

use anyhow::{bail, Context, Result};
use glam::Vec3;
use stride_sandbox::{AgentInput, GroundingStatus, MovementInput, Simulation};

const DEFAULT_TICKS: u64 = 600;

/// Input script for one agent.
struct Script {
    /// Ticks between jumps. Zero never jumps.
    jump_every: u64,
    /// Ticks between quarter turns. Zero never turns.
    turn_every: u64,
}

impl Script {
    fn input_at(&self, frame: u64) -> AgentInput {
        let every = |period: u64| period != 0 && frame % period == period - 1;

        AgentInput {
            movement: MovementInput {
                forward: true,
                ..Default::default()
            },
            jump: every(self.jump_every),
            turn: if every(self.turn_every) {
                std::f32::consts::FRAC_PI_2
            } else {
                0.0
            },
            frame: frame as u32,
        }
    }
}

fn parse_ticks() -> Result<u64> {
    match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("tick count must be a number, got {:?}", arg)),
        None => Ok(DEFAULT_TICKS),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let ticks = parse_ticks()?;

    // Create simulation
    let mut simulation = Simulation::test();
    let walker = simulation.add_agent("Walker")?;
    let hopper = simulation.add_agent("Hopper")?;

    let scripts = [
        Script {
            jump_every: 0,
            turn_every: 150,
        },
        Script {
            jump_every: 45,
            turn_every: 200,
        },
    ];

    let tick_rate = u64::from(simulation.config.tick_rate);
    let rollback_frame = ticks / 2;
    let mut snapshot = None;

    for frame in 0..ticks {
        if frame == rollback_frame {
            snapshot = Some(simulation.snapshot()?);
        }

        let inputs: Vec<AgentInput> = scripts.iter().map(|s| s.input_at(frame)).collect();
        simulation.tick(&inputs)?;

        if simulation.frame % tick_rate == 0 {
            for agent in &simulation.agents {
                log::info!(
                    "[{:>5}] {:<7} {:?} at {:.2?} v={:.2?} landings={}",
                    simulation.frame,
                    agent.name,
                    agent.status(),
                    agent.position(),
                    agent.motor.velocity(),
                    agent.landings,
                );
            }
        }
    }

    // Rewind to the midpoint, replay, and check the replay lands on the same frame
    let Some(snapshot) = snapshot else {
        return Ok(());
    };
    let expected: Vec<Vec3> = simulation.agents.iter().map(|a| a.position()).collect();

    simulation.restore(&snapshot)?;
    for frame in rollback_frame..ticks {
        let inputs: Vec<AgentInput> = scripts.iter().map(|s| s.input_at(frame)).collect();
        simulation.tick(&inputs)?;
    }

    let replayed: Vec<Vec3> = simulation.agents.iter().map(|a| a.position()).collect();
    if replayed != expected {
        bail!("rollback replay diverged: {:?} vs {:?}", replayed, expected);
    }
    log::info!("rollback from frame {} replayed identically", rollback_frame);

    for id in [walker, hopper] {
        if let Some(agent) = simulation.get_agent(id) {
            let grounded = agent.status() == GroundingStatus::Grounded;
            println!(
                "{}: {:.2?} grounded={} landings={}",
                agent.name,
                agent.position(),
                grounded,
                agent.landings
            );
        }
    }

    Ok(())
}
