//! Point contents codes.
//!
//! Contents follow the classic negative-code convention. The liquids occupy
//! the contiguous range [`Contents::LAVA`]..=[`Contents::WATER`]; sky sits
//! below them and blocks movement like solid.

use serde::{Deserialize, Serialize};

/// Contents code of a point in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contents(pub i32);

impl Contents {
    /// Open air.
    pub const EMPTY: Self = Self(-1);

    /// Solid world geometry.
    pub const SOLID: Self = Self(-2);

    /// Water volume.
    pub const WATER: Self = Self(-3);

    /// Slime volume.
    pub const SLIME: Self = Self(-4);

    /// Lava volume.
    pub const LAVA: Self = Self(-5);

    /// Sky brush. Blocks movement like solid.
    pub const SKY: Self = Self(-6);

    /// Whether this code denotes a liquid (water, slime or lava).
    #[inline]
    pub fn is_liquid(self) -> bool {
        (Self::LAVA.0..=Self::WATER.0).contains(&self.0)
    }

    /// Whether traces stop against this code.
    #[inline]
    pub fn is_solid(self) -> bool {
        self == Self::SOLID || self == Self::SKY
    }

    /// Deeper liquids win when two volumes overlap (lava over slime over water).
    #[inline]
    pub fn deeper(self, other: Self) -> Self {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }
}

impl Default for Contents {
    fn default() -> Self {
        Self::EMPTY
    }
}
