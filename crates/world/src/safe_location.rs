//! Randomised search for a nearby position a player can stand in.
//!
//! Each attempt draws a column within `radius` blocks of the origin and scans
//! it from the top of the effective height range down. A position at `y`
//! qualifies when the ground (`y - 1`) is solid footing and both the feet
//! (`y`) and head (`y + 1`) blocks are air. The first hit wins; when every
//! attempt misses the search reports [`SearchOutcome::NotFound`] without
//! relaxing any constraint.

use rand::Rng;
use serde::{Deserialize, Serialize};
use stuck_core::{BlockPos, HeightBounds, Location};
use tracing::{info, warn};

use crate::hazard::{is_hazardous, is_unstable};
use crate::{BlockSample, WorldQuery};

/// Configured lower scan bound when left at its default.
pub const DEFAULT_MIN_Y: i32 = 32;
/// Configured upper scan bound when left at its default.
pub const DEFAULT_MAX_Y: i32 = 120;

/// Tunables for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Horizontal search radius in blocks.
    pub radius: i32,
    /// Number of columns drawn before giving up.
    pub max_attempts: u32,
    pub min_y: i32,
    pub max_y: i32,
    /// Refuse ground whose material is classified as hazardous.
    pub avoid_hazardous: bool,
    /// Refuse leaves and snow as ground.
    pub avoid_unstable: bool,
    /// Emit per-attempt diagnostics.
    pub debug: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius: 5,
            max_attempts: 50,
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
            avoid_hazardous: true,
            avoid_unstable: true,
            debug: false,
        }
    }
}

impl SearchSettings {
    /// True only when both bounds are exactly the shipped defaults.
    pub fn uses_default_bounds(&self) -> bool {
        self.min_y == DEFAULT_MIN_Y && self.max_y == DEFAULT_MAX_Y
    }
}

/// Inclusive y range scanned in every column. Empty when `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    pub min: i32,
    pub max: i32,
}

impl ScanRange {
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Candidate feet levels, top to bottom.
    pub fn top_down(&self) -> impl Iterator<Item = i32> {
        (self.min..=self.max).rev()
    }
}

/// Intersect the configured range with the world limits.
///
/// One layer above the floor is reserved so the ground block exists, and two
/// below the (exclusive) ceiling so the head block exists. Untouched default
/// bounds are replaced by the whole usable height of the world.
pub fn effective_range(settings: &SearchSettings, world: HeightBounds) -> ScanRange {
    let floor = world.min + 1;
    let ceiling = world.max - 2;
    if settings.uses_default_bounds() {
        return ScanRange {
            min: floor,
            max: ceiling,
        };
    }
    ScanRange {
        min: settings.min_y.max(floor),
        max: settings.max_y.min(ceiling),
    }
}

/// Result of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    /// A safe spot, found on attempt number `attempts` (1-based).
    Found { location: Location, attempts: u32 },
    /// Every attempt was exhausted.
    NotFound { attempts: u32 },
}

impl SearchOutcome {
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Found { location, .. } => Some(*location),
            Self::NotFound { .. } => None,
        }
    }

    /// Number of columns drawn.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Found { attempts, .. } | Self::NotFound { attempts } => *attempts,
        }
    }
}

/// Whether a ground/feet/head triple is a place to stand.
pub fn qualifies(
    ground: &BlockSample<'_>,
    feet: &BlockSample<'_>,
    head: &BlockSample<'_>,
    settings: &SearchSettings,
) -> bool {
    ground.solid
        && !ground.liquid
        && !(settings.avoid_unstable && is_unstable(ground.material))
        && !(settings.avoid_hazardous && is_hazardous(ground.material))
        && feet.is_air()
        && head.is_air()
}

/// Search `world` around `origin` for a safe spot.
///
/// The returned location is centred on the block (`+0.5` on x and z), sits at
/// the qualifying feet level and keeps the origin's yaw and pitch. Query
/// errors only disqualify the position they occur at.
pub fn find_safe_location<W, R>(
    world: &W,
    origin: &Location,
    settings: &SearchSettings,
    rng: &mut R,
) -> SearchOutcome
where
    W: WorldQuery + ?Sized,
    R: Rng + ?Sized,
{
    if world.dimension() != origin.dimension {
        warn!(
            world = world.name(),
            origin = %origin,
            "origin is not in the queried world"
        );
        return SearchOutcome::NotFound { attempts: 0 };
    }

    let range = effective_range(settings, world.height_bounds());
    let start = origin.block_pos();
    let radius = settings.radius.max(0);

    if settings.debug {
        info!(
            "Looking for safe location in world {} around {}, {}, {} with Y range {}-{}",
            world.name(),
            start.x,
            start.y,
            start.z,
            range.min,
            range.max
        );
    }

    for attempt in 0..settings.max_attempts {
        let x = start.x + rng.gen_range(-radius..=radius);
        let z = start.z + rng.gen_range(-radius..=radius);

        let mut failures = ColumnFailures::default();
        for y in range.top_down() {
            let feet_pos = BlockPos::new(x, y, z);
            match sample_column(world, feet_pos) {
                Ok((ground, feet, head)) => {
                    if settings.debug && attempt % 10 == 0 {
                        info!(
                            "Attempt {attempt} checking ({x}, {y}, {z}): {}, {}, {}",
                            ground.material, feet.material, head.material
                        );
                    }
                    if qualifies(&ground, &feet, &head, settings) {
                        let location = Location {
                            dimension: origin.dimension,
                            x: f64::from(x) + 0.5,
                            y: f64::from(y),
                            z: f64::from(z) + 0.5,
                            yaw: origin.yaw,
                            pitch: origin.pitch,
                        };
                        failures.report(x, z);
                        if settings.debug {
                            info!("Found safe location at {x}, {y}, {z}");
                        }
                        return SearchOutcome::Found {
                            location,
                            attempts: attempt + 1,
                        };
                    }
                }
                Err(err) => failures.record(y, &err),
            }
        }
        failures.report(x, z);
    }

    if settings.debug {
        warn!(
            "Could not find safe location after {} attempts",
            settings.max_attempts
        );
    }
    SearchOutcome::NotFound {
        attempts: settings.max_attempts,
    }
}

/// Query errors hit while scanning one column, reported as a single warning.
#[derive(Debug, Default)]
struct ColumnFailures {
    first: Option<String>,
    count: u32,
    highest: i32,
    lowest: i32,
}

impl ColumnFailures {
    fn record(&mut self, y: i32, err: &crate::WorldError) {
        if self.first.is_none() {
            self.first = Some(err.to_string());
            self.highest = y;
        }
        self.lowest = y;
        self.count += 1;
    }

    fn report(&self, x: i32, z: i32) {
        if let Some(first) = &self.first {
            warn!(
                "Error checking column ({x}, {z}) at {} heights between y {} and {}: {first}",
                self.count, self.lowest, self.highest
            );
        }
    }
}

type Column<'a> = (BlockSample<'a>, BlockSample<'a>, BlockSample<'a>);

fn sample_column<W: WorldQuery + ?Sized>(
    world: &W,
    feet: BlockPos,
) -> Result<Column<'_>, crate::WorldError> {
    Ok((
        world.block_at(feet.offset_y(-1))?,
        world.block_at(feet)?,
        world.block_at(feet.offset_y(1))?,
    ))
}
