use std::fmt;

use stuck_core::{BlockPos, HeightBounds};

/// Chunk width (X axis) in blocks.
pub const CHUNK_SIZE_X: usize = 16;
/// Chunk depth (Z axis) in blocks.
pub const CHUNK_SIZE_Z: usize = 16;

/// Block identifier referencing the material registry.
pub type BlockId = u16;

/// Reserved ID for air.
pub const BLOCK_AIR: BlockId = 0;

/// Chunk-local position (X, Y, Z). `y` is measured from the world floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Convert to a linear index within the block array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE_X);
        debug_assert!(self.z < CHUNK_SIZE_Z);
        (self.y * CHUNK_SIZE_Z + self.z) * CHUNK_SIZE_X + self.x
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk column containing the given block.
    pub const fn containing(pos: BlockPos) -> Self {
        Self {
            x: pos.x >> 4,
            z: pos.z >> 4,
        }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A 16-wide column of blocks spanning the full world height.
#[derive(Clone)]
pub struct Chunk {
    position: ChunkPos,
    bounds: HeightBounds,
    blocks: Vec<BlockId>,
}

impl Chunk {
    /// Allocate a fresh chunk filled with air.
    pub fn new(position: ChunkPos, bounds: HeightBounds) -> Self {
        Self {
            position,
            bounds,
            blocks: vec![BLOCK_AIR; CHUNK_SIZE_X * CHUNK_SIZE_Z * bounds.height()],
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    #[inline]
    pub fn bounds(&self) -> HeightBounds {
        self.bounds
    }

    fn index(&self, x: usize, y: i32, z: usize) -> Option<usize> {
        if !self.bounds.contains(y) || x >= CHUNK_SIZE_X || z >= CHUNK_SIZE_Z {
            return None;
        }
        let y = (y - self.bounds.min) as usize;
        Some(LocalPos { x, y, z }.index())
    }

    /// Block at local `x`/`z` and world `y`; `None` outside the chunk.
    pub fn block(&self, x: usize, y: i32, z: usize) -> Option<BlockId> {
        self.index(x, y, z).map(|idx| self.blocks[idx])
    }

    /// Set a block at local `x`/`z` and world `y`. Returns false when out of range.
    pub fn set_block(&mut self, x: usize, y: i32, z: usize, id: BlockId) -> bool {
        match self.index(x, y, z) {
            Some(idx) => {
                self.blocks[idx] = id;
                true
            }
            None => false,
        }
    }

    /// Fill the horizontal layer at world `y` with one block.
    pub fn fill_layer(&mut self, y: i32, id: BlockId) {
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                self.set_block(x, y, z, id);
            }
        }
    }
}

/// Split a world block position into its chunk and the in-chunk x/z.
pub fn split_block_pos(pos: BlockPos) -> (ChunkPos, usize, usize) {
    let chunk = ChunkPos::containing(pos);
    let lx = pos.x.rem_euclid(CHUNK_SIZE_X as i32) as usize;
    let lz = pos.z.rem_euclid(CHUNK_SIZE_Z as i32) as usize;
    (chunk, lx, lz)
}
