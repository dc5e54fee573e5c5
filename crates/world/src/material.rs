//! Material registry: block ids to identifiers and physical traits.
//!
//! Identifiers are canonical upper-case strings (`STONE`, `OAK_LEAVES`). The
//! registry can be loaded from a JSON definition list or built from the
//! compiled-in defaults; id 0 is always `AIR`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::BlockId;

/// Identifier of the empty material.
pub const AIR: &str = "AIR";

/// Largest table whose ids all fit in a [`BlockId`].
pub const MAX_MATERIALS: usize = BlockId::MAX as usize + 1;

/// Material definition as authored in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialDefinition {
    /// Identifier (case-insensitive, stored upper-case).
    pub name: String,
    /// Whether entities can stand on / collide with the block.
    #[serde(default)]
    pub solid: bool,
    /// Whether the block is a fluid.
    #[serde(default)]
    pub liquid: bool,
}

/// Errors emitted while building a registry.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// Wrap IO errors when reading definitions.
    #[error("failed to read material definitions: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde parsing issues.
    #[error("failed to parse material definitions: {0}")]
    Parse(#[from] serde_json::Error),
    /// The first definition must be air so id 0 stays empty.
    #[error("material id 0 must be AIR, found {0}")]
    AirNotFirst(String),
    /// Identifiers must be unique.
    #[error("duplicate material identifier {0}")]
    Duplicate(String),
    /// More definitions than block ids.
    #[error("{0} material definitions exceed the limit of {}", MAX_MATERIALS)]
    TooMany(usize),
}

/// Resolved material metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    pub solid: bool,
    pub liquid: bool,
}

impl Material {
    pub fn new(name: &str, solid: bool, liquid: bool) -> Self {
        Self {
            name: name.trim().to_ascii_uppercase(),
            solid,
            liquid,
        }
    }

    /// Solid, non-fluid block.
    pub fn solid(name: &str) -> Self {
        Self::new(name, true, false)
    }

    /// Passable, non-fluid block.
    pub fn passable(name: &str) -> Self {
        Self::new(name, false, false)
    }

    /// Fluid block.
    pub fn liquid(name: &str) -> Self {
        Self::new(name, false, true)
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.name == AIR
    }
}

/// Registry storing materials keyed by block id.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    name_to_id: HashMap<String, BlockId>,
}

impl MaterialRegistry {
    /// Construct a registry, validating that id 0 is air, names are unique and
    /// every entry gets its own block id.
    pub fn new(materials: Vec<Material>) -> Result<Self, MaterialError> {
        if materials.len() > MAX_MATERIALS {
            return Err(MaterialError::TooMany(materials.len()));
        }
        match materials.first() {
            Some(first) if first.is_air() => {}
            Some(first) => return Err(MaterialError::AirNotFirst(first.name.clone())),
            None => return Err(MaterialError::AirNotFirst(String::new())),
        }
        let mut seen = HashSet::with_capacity(materials.len());
        for material in &materials {
            if !seen.insert(material.name.as_str()) {
                return Err(MaterialError::Duplicate(material.name.clone()));
            }
        }
        Ok(Self::build(materials))
    }

    fn build(materials: Vec<Material>) -> Self {
        let name_to_id = materials
            .iter()
            .enumerate()
            .map(|(id, material)| (material.name.clone(), id as BlockId))
            .collect();
        Self {
            materials,
            name_to_id,
        }
    }

    /// Load a registry from a JSON file of [`MaterialDefinition`]s.
    pub fn from_file(path: &Path) -> Result<Self, MaterialError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Load a registry from an in-memory JSON string.
    pub fn from_json(input: &str) -> Result<Self, MaterialError> {
        let defs: Vec<MaterialDefinition> = serde_json::from_str(input)?;
        Self::new(
            defs.into_iter()
                .map(|def| Material::new(&def.name, def.solid, def.liquid))
                .collect(),
        )
    }

    /// Look up a material by numeric id.
    pub fn get(&self, id: BlockId) -> Option<&Material> {
        self.materials.get(id as usize)
    }

    /// Resolve a block id by identifier (case-insensitive).
    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id
            .get(&name.trim().to_ascii_uppercase())
            .copied()
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate `(id, material)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Material)> + '_ {
        self.materials
            .iter()
            .enumerate()
            .map(|(id, material)| (id as BlockId, material))
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        let materials = vec![
            Material::passable(AIR),
            Material::solid("STONE"),
            Material::solid("DIRT"),
            Material::solid("GRASS_BLOCK"),
            Material::solid("SAND"),
            Material::solid("GRAVEL"),
            Material::solid("BEDROCK"),
            Material::solid("OAK_PLANKS"),
            Material::solid("OAK_LEAVES"),
            Material::solid("SNOW"),
            Material::solid("SNOW_BLOCK"),
            Material::liquid("WATER"),
            Material::liquid("LAVA"),
            Material::solid("MAGMA_BLOCK"),
            Material::solid("CACTUS"),
            Material::solid("CAMPFIRE"),
            Material::solid("SOUL_CAMPFIRE"),
            Material::passable("FIRE"),
            Material::passable("SOUL_FIRE"),
            Material::passable("SWEET_BERRY_BUSH"),
            Material::passable("WITHER_ROSE"),
            Material::solid("POINTED_DRIPSTONE"),
            Material::solid("EXPOSED_COPPER"),
            Material::solid("TRIAL_SPAWNER"),
            Material::passable("TALL_GRASS"),
            Material::passable("CAVE_AIR"),
        ];
        Self::build(materials)
    }
}
