//! Material classification used when choosing a block to stand on.
//!
//! Both predicates are literal substring tests over the material identifier.
//! They are best-effort and deliberately over-approximate: any material whose
//! name happens to contain one of the fragments is treated as matching.

/// Identifier fragments that mark a material as harmful to stand on.
pub const HAZARD_FRAGMENTS: [&str; 8] = [
    "LAVA",
    "FIRE",
    "MAGMA",
    "CACTUS",
    "SWEET_BERRY_BUSH",
    "CAMPFIRE",
    "WITHER_ROSE",
    "POINTED_DRIPSTONE",
];

/// Identifiers that are hazardous by exact match.
pub const HAZARD_EXACT: [&str; 2] = ["SOUL_FIRE", "SOUL_CAMPFIRE"];

/// True when standing on `material` is likely to hurt the player.
pub fn is_hazardous(material: &str) -> bool {
    let name = material.to_ascii_uppercase();
    HAZARD_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
        || HAZARD_EXACT.contains(&name.as_str())
        || (name.contains("EXPOSED") && name.contains("COPPER"))
        || (name.contains("TRIAL") && name.contains("SPAWNER"))
}

/// True for leaves and snow, which make poor footing.
pub fn is_unstable(material: &str) -> bool {
    let name = material.to_ascii_uppercase();
    name.contains("LEAVES") || name.contains("SNOW")
}
