//! Voxel world model and the safe-location search that runs over it.

mod chunk;
pub mod hazard;
mod material;
mod query;
pub mod safe_location;
mod source;
mod storage;
mod world;

pub use chunk::*;
pub use material::*;
pub use query::*;
pub use safe_location::{find_safe_location, SearchOutcome, SearchSettings};
pub use source::*;
pub use storage::*;
pub use world::*;
