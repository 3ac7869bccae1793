//! Motor snapshots for save/restore and rollback.
//!
//! A [`MotorState`] holds everything that carries over from one tick to the
//! next. Applying a captured state and replaying the same inputs reproduces
//! the same ticks.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::base::BaseTracker;
use super::report::GroundingReport;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Everything a motor needs to resume from a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorState {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub must_unground: bool,
    pub must_unground_time: f32,
    pub last_movement_iteration_found_any_ground: bool,
    pub grounding: GroundingReport,
    pub last_grounding: GroundingReport,
    pub base: BaseTracker,
    pub stuck_in_geometry: bool,
}

impl MotorState {
    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let (state, _) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::HitResult;

    fn sample_state() -> MotorState {
        let hit = HitResult::blocking(0.2, 0.5, Vec3::new(1.0, 0.0, 2.0), Vec3::Y, Vec3::Y, Some(3));
        MotorState {
            position: Vec3::new(1.0, 0.01, 2.0),
            rotation: Quat::from_rotation_y(0.7),
            velocity: Vec3::new(4.0, 0.0, -1.5),
            must_unground: false,
            must_unground_time: 0.05,
            last_movement_iteration_found_any_ground: true,
            grounding: GroundingReport {
                found_any_ground: true,
                is_stable_on_ground: true,
                ground_point: hit.impact_point,
                ground_object: hit.object,
                floor_distance: 0.01,
                hit: Some(hit),
                ..Default::default()
            },
            last_grounding: GroundingReport::default(),
            base: BaseTracker {
                object: Some(3),
                velocity: Vec3::new(2.0, 0.0, 0.0),
                simulates_physics: false,
            },
            stuck_in_geometry: false,
        }
    }

    #[test]
    fn test_codec_roundtrip() {
        let state = sample_state();

        let encoded = state.encode().unwrap();
        let decoded = MotorState::decode(&encoded).unwrap();

        assert_eq!(decoded, state);
    }

    #[test]
    fn test_decode_truncated_data_fails() {
        let encoded = sample_state().encode().unwrap();

        let result = MotorState::decode(&encoded[..encoded.len() / 2]);

        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
