//! Read-only world access consumed by the safe-location search.

use stuck_core::{BlockPos, DimensionId, HeightBounds};
use thiserror::Error;

use crate::material::AIR;
use crate::{BlockId, ChunkPos};

/// Classification of a single block as seen by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSample<'a> {
    /// Material identifier (upper-case).
    pub material: &'a str,
    pub solid: bool,
    pub liquid: bool,
}

impl BlockSample<'_> {
    #[inline]
    pub fn is_air(&self) -> bool {
        self.material == AIR
    }
}

/// Errors raised by world queries and chunk management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("y={y} is outside the world height {min}..{max}")]
    OutOfBounds { y: i32, min: i32, max: i32 },
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),
    #[error("unknown block id {0}")]
    UnknownBlock(BlockId),
    #[error("unknown material {0}")]
    UnknownMaterial(String),
    #[error("failed to load chunk {pos}: {reason}")]
    ChunkLoad { pos: ChunkPos, reason: String },
}

/// Block lookups over a single world.
///
/// Implementations must be cheap and non-blocking; the search calls
/// [`WorldQuery::block_at`] hundreds of times per invocation.
pub trait WorldQuery {
    /// Human-readable world name for logs and messages.
    fn name(&self) -> &str;

    fn dimension(&self) -> DimensionId;

    /// Physical build limits; `max` is exclusive.
    fn height_bounds(&self) -> HeightBounds;

    /// Classify the block at `pos`. Fails for positions outside the height
    /// limits or in chunks that are not resident.
    fn block_at(&self, pos: BlockPos) -> Result<BlockSample<'_>, WorldError>;
}
