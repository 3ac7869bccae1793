//! Collision shapes for controlled bodies.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shape of a controlled body.
///
/// Positions handed to queries are the **bottom-center** of the shape in the
/// body's local frame, so a body standing on a floor at `y = 0` has
/// `position.y == 0` (plus whatever clearance the motor keeps).
///
/// - **Capsule**: cylinder with hemisphere caps along the local Y axis. Slides
///   over small edges and reads the contact normal smoothly on slopes.
/// - **Box**: oriented box. Flat bottom, useful for crates and vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// A capsule along the local Y axis.
    Capsule {
        /// Radius of the cylinder and end caps.
        radius: f32,
        /// Total height from the bottom of the lower cap to the top of the upper cap.
        height: f32,
    },

    /// A box defined by half-extents in each local axis.
    Box {
        /// Half-size in each axis (x, y, z).
        half_extents: Vec3,
    },
}

impl BodyShape {
    /// A human-sized capsule.
    pub const HUMANOID: Self = Self::Capsule {
        radius: 0.4,
        height: 1.8,
    };

    /// Create a capsule. Heights below `2 * radius` collapse to a sphere.
    pub fn capsule(radius: f32, height: f32) -> Self {
        Self::Capsule {
            radius,
            height: height.max(2.0 * radius),
        }
    }

    /// Horizontal radius used for probing distances and ledge checks.
    pub fn radius(&self) -> f32 {
        match self {
            Self::Capsule { radius, .. } => *radius,
            Self::Box { half_extents } => half_extents.x.max(half_extents.z),
        }
    }

    /// Total height of the shape.
    pub fn height(&self) -> f32 {
        match self {
            Self::Capsule { height, .. } => *height,
            Self::Box { half_extents } => half_extents.y * 2.0,
        }
    }

    /// Distance from the bottom-center to the geometric center.
    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height() * 0.5
    }

    /// Highest point, measured up from the bottom, at which an obstruction
    /// can still be treated as something to climb over.
    ///
    /// For a capsule this is where the upper hemisphere starts; anything
    /// higher hits the body's "head".
    pub fn step_ceiling(&self) -> f32 {
        match self {
            Self::Capsule { radius, height } => height - radius,
            Self::Box { half_extents } => half_extents.y * 2.0,
        }
    }

    /// Local bounding box relative to the geometric center.
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        match self {
            Self::Capsule { radius, height } => {
                let half_height = height / 2.0;
                (
                    Vec3::new(-*radius, -half_height, -*radius),
                    Vec3::new(*radius, half_height, *radius),
                )
            }
            Self::Box { half_extents } => (-*half_extents, *half_extents),
        }
    }
}

impl Default for BodyShape {
    fn default() -> Self {
        Self::HUMANOID
    }
}
