#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod dimension;
pub mod player;
pub mod position;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use dimension::{DimensionId, HeightBounds};
pub use player::PlayerId;
pub use position::{BlockPos, Location};

/// Host clock rate.
pub const TICKS_PER_SECOND: u64 = 20;

/// Fixed tick type (20 TPS => 50 ms per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// Ticks elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn since(self, earlier: SimTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Helper to derive a reproducible RNG for a search, seeded by a server seed
/// and the invoking tick.
pub fn scoped_rng(server_seed: u64, tick: SimTick) -> StdRng {
    StdRng::seed_from_u64(server_seed ^ tick.0)
}
