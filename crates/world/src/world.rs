//! In-memory voxel world: resident chunks plus an on-demand chunk source.

use std::sync::Arc;

use stuck_core::{BlockPos, DimensionId, HeightBounds};
use tracing::debug;

use crate::{
    split_block_pos, BlockId, BlockSample, ChunkPos, ChunkSource, ChunkStorage, MaterialRegistry,
    WorldError, WorldQuery,
};

/// Default number of chunks kept resident per world.
pub const DEFAULT_RESIDENT_CHUNKS: usize = 1024;

/// A single dimension's blocks.
///
/// Only resident chunks answer queries; everything else must be loaded
/// through [`VoxelWorld::load_chunk`] first.
pub struct VoxelWorld {
    name: String,
    dimension: DimensionId,
    bounds: HeightBounds,
    materials: Arc<MaterialRegistry>,
    chunks: ChunkStorage,
    source: Box<dyn ChunkSource + Send>,
}

impl VoxelWorld {
    pub fn new(
        name: impl Into<String>,
        dimension: DimensionId,
        materials: Arc<MaterialRegistry>,
        source: impl ChunkSource + Send + 'static,
    ) -> Self {
        Self::with_capacity(
            name,
            dimension,
            materials,
            source,
            DEFAULT_RESIDENT_CHUNKS,
        )
    }

    pub fn with_capacity(
        name: impl Into<String>,
        dimension: DimensionId,
        materials: Arc<MaterialRegistry>,
        source: impl ChunkSource + Send + 'static,
        resident_chunks: usize,
    ) -> Self {
        Self {
            name: name.into(),
            dimension,
            bounds: dimension.height_bounds(),
            materials,
            chunks: ChunkStorage::new(resident_chunks),
            source: Box::new(source),
        }
    }

    /// Override the dimension's default height limits.
    pub fn with_height_bounds(mut self, bounds: HeightBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains(pos)
    }

    /// Number of resident chunks.
    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Make the chunk resident, producing it from the source if needed.
    pub fn load_chunk(&mut self, pos: ChunkPos) -> Result<(), WorldError> {
        if self.chunks.contains(pos) {
            return Ok(());
        }
        let chunk = self.source.produce(pos, self.bounds)?;
        debug!(world = %self.name, chunk = %pos, "chunk loaded");
        self.chunks.insert(chunk);
        Ok(())
    }

    /// Load every chunk within `radius` chunks of `center`.
    pub fn load_area(&mut self, center: ChunkPos, radius: i32) -> Result<(), WorldError> {
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                self.load_chunk(ChunkPos::new(center.x + dx, center.z + dz))?;
            }
        }
        Ok(())
    }

    /// Replace the block at `pos`. The containing chunk must be resident.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId) -> Result<(), WorldError> {
        if self.materials.get(id).is_none() {
            return Err(WorldError::UnknownBlock(id));
        }
        self.check_height(pos.y)?;
        let (chunk_pos, lx, lz) = split_block_pos(pos);
        let chunk = self
            .chunks
            .get_mut(chunk_pos)
            .ok_or(WorldError::ChunkNotLoaded(chunk_pos))?;
        chunk.set_block(lx, pos.y, lz, id);
        Ok(())
    }

    /// Replace the block at `pos` by material identifier.
    pub fn set_material(&mut self, pos: BlockPos, material: &str) -> Result<(), WorldError> {
        let id = self
            .materials
            .id_by_name(material)
            .ok_or_else(|| WorldError::UnknownMaterial(material.to_string()))?;
        self.set_block(pos, id)
    }

    fn check_height(&self, y: i32) -> Result<(), WorldError> {
        if self.bounds.contains(y) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds {
                y,
                min: self.bounds.min,
                max: self.bounds.max,
            })
        }
    }
}

impl WorldQuery for VoxelWorld {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn height_bounds(&self) -> HeightBounds {
        self.bounds
    }

    fn block_at(&self, pos: BlockPos) -> Result<BlockSample<'_>, WorldError> {
        self.check_height(pos.y)?;
        let (chunk_pos, lx, lz) = split_block_pos(pos);
        let chunk = self
            .chunks
            .get(chunk_pos)
            .ok_or(WorldError::ChunkNotLoaded(chunk_pos))?;
        let id = chunk.block(lx, pos.y, lz).ok_or(WorldError::OutOfBounds {
            y: pos.y,
            min: self.bounds.min,
            max: self.bounds.max,
        })?;
        let material = self.materials.get(id).ok_or(WorldError::UnknownBlock(id))?;
        Ok(BlockSample {
            material: &material.name,
            solid: material.solid,
            liquid: material.liquid,
        })
    }
}
