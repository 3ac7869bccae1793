//! Value types the motor produces: grounding, hit stability, events and the
//! per-tick report.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::{HitResult, ObjectId};

/// Coarse movement status reported each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroundingStatus {
    /// Not solving grounding: stuck in geometry or grounding disabled.
    #[default]
    None,
    /// Standing on stable ground.
    Grounded,
    /// In the air or sliding on unstable ground.
    Airborne,
}

/// What the ground probe found under the body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundingReport {
    /// Something was found under the body, stable or not.
    pub found_any_ground: bool,
    /// The body stands on ground it can walk on.
    pub is_stable_on_ground: bool,
    /// Ground was geometrically walkable but the body must not snap to it
    /// (ledge, denivelation).
    pub snapping_prevented: bool,
    /// Surface normal of the ground. Equals the body's up axis when nothing was found.
    pub ground_normal: Vec3,
    /// Normal found by the ledge cast on the body's side of the hit.
    pub inner_ground_normal: Vec3,
    /// Normal found by the ledge cast on the far side of the hit.
    pub outer_ground_normal: Vec3,
    /// Contact point on the ground.
    pub ground_point: Vec3,
    /// Height of the body's bottom above the ground point.
    pub floor_distance: f32,
    /// Object the body stands on.
    pub ground_object: Option<ObjectId>,
    /// Raw probe hit.
    pub hit: Option<HitResult>,
}

impl GroundingReport {
    /// A report that found nothing.
    pub fn ungrounded(up: Vec3) -> Self {
        Self {
            found_any_ground: false,
            is_stable_on_ground: false,
            snapping_prevented: false,
            ground_normal: up,
            inner_ground_normal: Vec3::ZERO,
            outer_ground_normal: Vec3::ZERO,
            ground_point: Vec3::ZERO,
            floor_distance: 0.0,
            ground_object: None,
            hit: None,
        }
    }
}

impl Default for GroundingReport {
    fn default() -> Self {
        Self::ungrounded(Vec3::Y)
    }
}

/// Ledge geometry around a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgeReport {
    /// Only the far-side cast found stable ground: the body hangs over the drop.
    pub on_empty_side: bool,
    /// Velocity points toward the drop.
    pub moving_towards_empty_side: bool,
    /// Planar distance from the body's bottom point to the hit.
    pub distance_from_ledge: f32,
    /// Normal of the stable side of the ledge.
    pub ground_normal: Vec3,
    /// Direction along the ledge's edge.
    pub right: Vec3,
    /// Direction across the edge, flattened onto the body's horizontal plane.
    pub facing: Vec3,
}

/// A step found under an unstable hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepCandidate {
    /// Object whose top the body could step onto.
    pub object: Option<ObjectId>,
    /// Landing point on top of the step.
    pub landing_point: Vec3,
}

/// Stability of a single hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitStabilityReport {
    /// The body could stand on this hit.
    pub is_stable: bool,
    pub found_inner_normal: bool,
    pub inner_normal: Vec3,
    pub found_outer_normal: bool,
    pub outer_normal: Vec3,
    /// Set when the two ledge casts disagree about stability.
    pub ledge: Option<LedgeReport>,
    /// Set when the hit is the riser of a climbable step.
    pub step: Option<StepCandidate>,
}

impl HitStabilityReport {
    /// An unstable report with both normals set to `normal`.
    pub fn unstable(normal: Vec3) -> Self {
        Self {
            is_stable: false,
            found_inner_normal: false,
            inner_normal: normal,
            found_outer_normal: false,
            outer_normal: normal,
            ledge: None,
            step: None,
        }
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotorEvent {
    /// The body went from unstable to stable ground.
    Landed { point: Vec3, normal: Vec3 },
    /// The body lost stable ground.
    LeftGround,
    /// A movement sweep hit something.
    MovementHit {
        point: Vec3,
        normal: Vec3,
        object: Option<ObjectId>,
        stable: bool,
    },
    /// The body climbed a step.
    SteppedUp { height: f32, object: Option<ObjectId> },
    /// The body moved onto, off or between moving bases.
    BaseChanged {
        previous: Option<ObjectId>,
        current: Option<ObjectId>,
    },
    /// Depenetration failed; movement is suspended.
    StuckInGeometry { position: Vec3 },
    /// A stuck body was pushed free.
    FreedFromGeometry { position: Vec3 },
    /// The sweep budget ran out with movement left over.
    MovementIterationsExceeded { remaining_distance: f32 },
}

/// Outcome of one motor tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: GroundingStatus,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Ground normal when standing on stable ground.
    pub floor_normal: Option<Vec3>,
    /// Ground contact point when standing on stable ground.
    pub floor_point: Option<Vec3>,
    pub stuck_in_geometry: bool,
    /// Events raised this tick, in order.
    pub events: Vec<MotorEvent>,
}

impl TickReport {
    /// Whether any event matches `predicate`.
    pub fn has_event(&self, predicate: impl Fn(&MotorEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}
