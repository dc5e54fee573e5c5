//! Block coordinates and precise entity locations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DimensionId;

/// Integer block position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The position `dy` blocks above (negative for below).
    pub const fn offset_y(self, dy: i32) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
            z: self.z,
        }
    }

    /// Chunk column coordinates `(x >> 4, z >> 4)`.
    pub const fn chunk_coords(self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Precise position plus orientation inside a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Dimension the location belongs to.
    pub dimension: DimensionId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Horizontal facing in degrees.
    pub yaw: f32,
    /// Vertical facing in degrees.
    pub pitch: f32,
}

impl Location {
    /// Location with zero orientation.
    pub fn new(dimension: DimensionId, x: f64, y: f64, z: f64) -> Self {
        Self {
            dimension,
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Copy of this location with the given orientation.
    pub fn with_rotation(self, yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch, ..self }
    }

    /// Copy of this location moved by the given deltas.
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            ..self
        }
    }

    /// Block containing this location (coordinates floored).
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// Chunk column coordinates of the containing block.
    pub fn chunk_coords(&self) -> (i32, i32) {
        self.block_pos().chunk_coords()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {:.2}, {:.2}, {:.2}",
            self.dimension, self.x, self.y, self.z
        )
    }
}
