//! Chunk producers used when a non-resident chunk is requested.

use stuck_core::HeightBounds;

use crate::{BlockId, Chunk, ChunkPos, WorldError};

/// Produces chunk contents on demand.
pub trait ChunkSource {
    fn produce(&mut self, pos: ChunkPos, bounds: HeightBounds) -> Result<Chunk, WorldError>;
}

impl<F> ChunkSource for F
where
    F: FnMut(ChunkPos, HeightBounds) -> Result<Chunk, WorldError>,
{
    fn produce(&mut self, pos: ChunkPos, bounds: HeightBounds) -> Result<Chunk, WorldError> {
        self(pos, bounds)
    }
}

/// Superflat generator: horizontal layers stacked up from the world floor.
#[derive(Debug, Clone, Default)]
pub struct FlatSource {
    layers: Vec<(BlockId, u32)>,
}

impl FlatSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `thickness` layers of `block` on top of the existing ones.
    pub fn layer(mut self, block: BlockId, thickness: u32) -> Self {
        self.layers.push((block, thickness));
        self
    }

    /// World y of the first air layer above the stack.
    pub fn surface_y(&self, bounds: HeightBounds) -> i32 {
        let total: u32 = self.layers.iter().map(|(_, thickness)| thickness).sum();
        bounds.min.saturating_add(total as i32).min(bounds.max)
    }
}

impl ChunkSource for FlatSource {
    fn produce(&mut self, pos: ChunkPos, bounds: HeightBounds) -> Result<Chunk, WorldError> {
        let mut chunk = Chunk::new(pos, bounds);
        let mut y = bounds.min;
        for &(block, thickness) in &self.layers {
            for _ in 0..thickness {
                if y >= bounds.max {
                    return Ok(chunk);
                }
                chunk.fill_layer(y, block);
                y += 1;
            }
        }
        Ok(chunk)
    }
}
