//! Dimension identifiers and their vertical limits.
//!
//! Every location carries the dimension it lives in, so a search or teleport
//! can always resolve the world it targets. Height limits follow the vanilla
//! layout: the Overworld spans `-64..320`, Nether and End span `0..256`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The dimension a world, location or search belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DimensionId {
    /// Surface world, `-64..320`.
    Overworld,
    /// Nether, `0..256`.
    Nether,
    /// The End, `0..256`.
    End,
}

impl DimensionId {
    /// Default (Overworld) dimension.
    pub const DEFAULT: Self = Self::Overworld;

    /// Canonical string key used in configs/logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
            Self::End => "end",
        }
    }

    /// Physical build limits of this dimension.
    pub const fn height_bounds(self) -> HeightBounds {
        match self {
            Self::Overworld => HeightBounds::new(-64, 320),
            Self::Nether | Self::End => HeightBounds::new(0, 256),
        }
    }
}

impl Default for DimensionId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical extent of a world: `min` is the lowest block, `max` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightBounds {
    /// Lowest valid block y (inclusive).
    pub min: i32,
    /// One past the highest valid block y.
    pub max: i32,
}

impl HeightBounds {
    /// Construct bounds covering `min..max`.
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Number of block layers.
    pub fn height(self) -> usize {
        (self.max - self.min).max(0) as usize
    }

    /// True when `y` lies inside `min..max`.
    pub fn contains(self, y: i32) -> bool {
        (self.min..self.max).contains(&y)
    }
}
