//! Content flags for collision filtering.
//!
//! Every brush in the world carries a set of content flags. Queries pass a
//! mask and only brushes whose contents intersect it are considered.

use serde::{Deserialize, Serialize};

/// Content flags describe what type of volume a brush is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space - nothing here.
    pub const EMPTY: Self = Self(0);

    /// Solid world geometry - walls, floors, platforms.
    pub const SOLID: Self = Self(1 << 0);

    /// Invisible blocker that only stops controlled bodies.
    pub const BODY_CLIP: Self = Self(1 << 1);

    /// Sensor volume. Never blocks movement.
    pub const SENSOR: Self = Self(1 << 2);

    /// Standard mask for controlled body queries.
    pub const MASK_BODY_SOLID: Self = Self(Self::SOLID.0 | Self::BODY_CLIP.0);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for ContentFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_mask_ignores_sensors() {
        assert!(ContentFlags::MASK_BODY_SOLID.intersects(ContentFlags::SOLID));
        assert!(ContentFlags::MASK_BODY_SOLID.intersects(ContentFlags::BODY_CLIP));
        assert!(!ContentFlags::MASK_BODY_SOLID.intersects(ContentFlags::SENSOR));
    }

    #[test]
    fn test_flag_ops() {
        let flags = ContentFlags::SOLID | ContentFlags::SENSOR;
        assert!(flags.contains(ContentFlags::SOLID));
        assert!(!flags.contains(ContentFlags::BODY_CLIP));
        assert_eq!(flags & ContentFlags::SENSOR, ContentFlags::SENSOR);
    }
}
