//! Moving-base tracking.
//!
//! A base is whatever moving object the body stands on. The body is carried
//! along with it before integration, and when it steps onto or off a base
//! the difference in base velocity is handed to the body so momentum is not
//! lost.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionQuery, ObjectId};

use super::body::ControlledBody;
use super::report::{GroundingReport, MotorEvent};

/// The base a body is riding, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseTracker {
    /// Object the body stands on.
    pub object: Option<ObjectId>,
    /// Velocity of the base at the body's floor contact, as last sampled.
    pub velocity: Vec3,
    /// The base is driven by a physics simulation.
    pub simulates_physics: bool,
}

impl BaseTracker {
    /// Velocity this base lends to a body that rides it.
    ///
    /// Simulated bases lend nothing.
    pub fn imparted_velocity(&self) -> Vec3 {
        if self.simulates_physics {
            Vec3::ZERO
        } else {
            self.velocity
        }
    }

    /// Move the body along with its base for one tick, without sweeping.
    ///
    /// The base has already moved and may have swept into the body, so a
    /// sweep here would only report a false hit.
    pub fn follow(&mut self, query: &dyn CollisionQuery, body: &mut ControlledBody, delta_time: f32) {
        let Some(object) = self.object else {
            return;
        };

        match query.base_motion(object) {
            Some(motion) => {
                self.velocity = motion.velocity_at(body.position);
                self.simulates_physics = motion.simulates_physics;
                body.teleport_by(self.velocity * delta_time);
            }
            None => {
                // Stopped moving or gone; the next refresh drops it
                self.velocity = Vec3::ZERO;
            }
        }
    }

    /// Re-derive the base from this tick's grounding.
    ///
    /// On a change of base, `impart` hands the old base's velocity to the
    /// body and takes the new one's away. Returns the change event.
    pub fn refresh(
        &mut self,
        query: &dyn CollisionQuery,
        body: &mut ControlledBody,
        grounding: &GroundingReport,
        impart: bool,
    ) -> Option<MotorEvent> {
        let next = grounding
            .ground_object
            .filter(|_| grounding.is_stable_on_ground)
            .and_then(|object| query.base_motion(object).map(|motion| (object, motion)))
            .map(|(object, motion)| BaseTracker {
                object: Some(object),
                velocity: motion.velocity_at(body.position),
                simulates_physics: motion.simulates_physics,
            })
            .unwrap_or_default();

        let previous = self.object;
        let changed = next.object != previous;

        if changed && impart {
            body.velocity += self.imparted_velocity() - next.imparted_velocity();
        }
        *self = next;

        if !changed {
            return None;
        }

        log::debug!("base changed {:?} -> {:?}", previous, next.object);
        Some(MotorEvent::BaseChanged {
            previous,
            current: next.object,
        })
    }
}
