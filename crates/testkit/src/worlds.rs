//! Canned worlds for search and teleport tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use stuck_core::{DimensionId, Location};
use stuck_world::{ChunkPos, FlatSource, MaterialRegistry, VoxelWorld};

/// The stock material table behind every canned world.
pub fn materials() -> Arc<MaterialRegistry> {
    Arc::new(MaterialRegistry::default())
}

/// Superflat world whose top solid layer is `ground` at `surface_y - 1`.
///
/// Everything below the top layer is stone on a bedrock floor.
pub fn flat_world(dimension: DimensionId, surface_y: i32, ground: &str) -> Result<VoxelWorld> {
    let materials = materials();
    let bounds = dimension.height_bounds();
    let depth = surface_y
        .checked_sub(bounds.min)
        .filter(|depth| *depth >= 2)
        .with_context(|| format!("surface {surface_y} too close to the floor {}", bounds.min))?;

    let id = |name: &str| {
        materials
            .id_by_name(name)
            .with_context(|| format!("unknown material {name}"))
    };
    let source = FlatSource::new()
        .layer(id("BEDROCK")?, 1)
        .layer(id("STONE")?, depth as u32 - 2)
        .layer(id(ground)?, 1);
    Ok(VoxelWorld::new("world", dimension, materials, source))
}

/// Flat world whose entire surface is lava.
pub fn lava_world(dimension: DimensionId, surface_y: i32) -> Result<VoxelWorld> {
    flat_world(dimension, surface_y, "LAVA")
}

/// Make every chunk within `radius` chunks of `at` resident.
pub fn load_around(world: &mut VoxelWorld, at: &Location, radius: i32) -> Result<()> {
    let (cx, cz) = at.chunk_coords();
    world
        .load_area(ChunkPos::new(cx, cz), radius)
        .with_context(|| format!("loading chunks around {at}"))
}
