//! Capabilities the command consumes from the hosting game server.

use stuck_core::{DimensionId, Location, PlayerId};
use stuck_world::{ChunkPos, WorldQuery};
use thiserror::Error;

use crate::effects::{ChatMessage, ParticleBurst, SoundCue, Title};

/// Failures reported by host operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("player {0} is not online")]
    PlayerOffline(PlayerId),
    #[error("world {0} is not available")]
    WorldUnavailable(DimensionId),
    #[error("could not load chunk {pos}: {reason}")]
    ChunkLoad { pos: ChunkPos, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Fire-and-forget feedback to players.
///
/// Cosmetic calls return a `Result` only so failures can be logged; they
/// never change the outcome of a command.
pub trait Messenger {
    fn send_message(&mut self, player: PlayerId, message: ChatMessage);

    fn show_title(&mut self, player: PlayerId, title: Title);

    fn play_sound(&mut self, at: &Location, cue: SoundCue) -> Result<(), HostError>;

    fn spawn_particles(&mut self, at: &Location, burst: ParticleBurst) -> Result<(), HostError>;
}

/// Player and chunk operations needed to carry out a teleport.
pub trait TeleportHost: Messenger {
    /// Display name, falling back to the id for unknown players.
    fn player_name(&self, player: PlayerId) -> String;

    /// Current location, `None` when the player is offline.
    fn player_location(&self, player: PlayerId) -> Option<Location>;

    fn is_chunk_loaded(&self, dimension: DimensionId, chunk: ChunkPos) -> bool;

    /// Request that a chunk becomes resident.
    fn load_chunk(&mut self, dimension: DimensionId, chunk: ChunkPos) -> Result<(), HostError>;

    /// Move the player. `Ok(false)` means the host refused the move.
    fn teleport(&mut self, player: PlayerId, to: &Location) -> Result<bool, HostError>;
}

/// Read access to the worlds a host keeps, by dimension.
pub trait WorldAccess {
    fn world_query(&self, dimension: DimensionId) -> Option<&dyn WorldQuery>;
}

/// Permission lookups.
pub trait Permissions {
    fn has_permission(&self, player: PlayerId, node: &str) -> bool;
}

/// Wall clock used for cooldown bookkeeping.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
