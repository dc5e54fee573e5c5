//! Server-side half of the `/stuck` command: host capabilities, the tick
//! scheduler, cooldowns and the delayed teleport sequence.
//!
//! [`Server`] is a headless host that keeps worlds and players in memory and
//! records everything a real server would show to its players.

pub mod cooldown;
pub mod effects;
pub mod host;
pub mod scheduler;
pub mod sequencer;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use stuck_core::{DimensionId, Location, PlayerId};
use stuck_world::{ChunkPos, VoxelWorld, WorldQuery};
use tracing::{debug, info};

pub use cooldown::CooldownLedger;
pub use effects::{ChatMessage, ParticleBurst, ParticleKind, SoundCue, SoundId, Title, Tone};
pub use host::{
    Clock, HostError, Messenger, Permissions, SystemClock, TeleportHost, WorldAccess,
};
pub use scheduler::{Scheduler, TickScheduler};
pub use sequencer::{
    PendingTeleport, SequencerOptions, TeleportId, TeleportOutcome, TeleportSequencer,
    TeleportStage, TeleportStep,
};

/// A connected player as seen by the headless host.
#[derive(Debug, Clone)]
pub struct OnlinePlayer {
    pub name: String,
    pub location: Location,
    permissions: BTreeSet<String>,
}

impl OnlinePlayer {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            permissions: BTreeSet::new(),
        }
    }

    /// Grant a permission node.
    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.permissions.insert(node.into());
        self
    }
}

/// Something the host showed or did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    Message {
        player: PlayerId,
        message: ChatMessage,
    },
    Title {
        player: PlayerId,
        title: Title,
    },
    Sound {
        at: Location,
        cue: SoundCue,
    },
    Particles {
        at: Location,
        burst: ParticleBurst,
    },
    Teleport {
        player: PlayerId,
        from: Location,
        to: Location,
    },
}

/// Headless authoritative host: worlds by dimension plus online players.
#[derive(Default)]
pub struct Server {
    worlds: BTreeMap<DimensionId, VoxelWorld>,
    players: BTreeMap<PlayerId, OnlinePlayer>,
    deliveries: Vec<Delivery>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a world, replacing any previous world for its dimension.
    pub fn add_world(&mut self, world: VoxelWorld) {
        info!(world = world.name(), dimension = %world.dimension(), "world registered");
        self.worlds.insert(world.dimension(), world);
    }

    pub fn world(&self, dimension: DimensionId) -> Option<&VoxelWorld> {
        self.worlds.get(&dimension)
    }

    pub fn world_mut(&mut self, dimension: DimensionId) -> Option<&mut VoxelWorld> {
        self.worlds.get_mut(&dimension)
    }

    pub fn join(&mut self, id: PlayerId, player: OnlinePlayer) {
        debug!(player = %player.name, %id, "player joined");
        self.players.insert(id, player);
    }

    /// Remove a player. Returns the player if they were online.
    pub fn leave(&mut self, id: PlayerId) -> Option<OnlinePlayer> {
        self.players.remove(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&OnlinePlayer> {
        self.players.get(&id)
    }

    /// Everything delivered so far.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Take the recorded deliveries, leaving the log empty.
    pub fn drain_deliveries(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.deliveries)
    }

    /// Chat lines sent to `player`, oldest first.
    pub fn messages_for(&self, player: PlayerId) -> impl Iterator<Item = &ChatMessage> + '_ {
        self.deliveries.iter().filter_map(move |delivery| match delivery {
            Delivery::Message { player: to, message } if *to == player => Some(message),
            _ => None,
        })
    }

    fn world_for(&self, dimension: DimensionId) -> Result<&VoxelWorld, HostError> {
        self.worlds
            .get(&dimension)
            .ok_or(HostError::WorldUnavailable(dimension))
    }
}

impl Messenger for Server {
    fn send_message(&mut self, player: PlayerId, message: ChatMessage) {
        if self.players.contains_key(&player) {
            self.deliveries.push(Delivery::Message { player, message });
        }
    }

    fn show_title(&mut self, player: PlayerId, title: Title) {
        if self.players.contains_key(&player) {
            self.deliveries.push(Delivery::Title { player, title });
        }
    }

    fn play_sound(&mut self, at: &Location, cue: SoundCue) -> Result<(), HostError> {
        self.world_for(at.dimension)?;
        self.deliveries.push(Delivery::Sound { at: *at, cue });
        Ok(())
    }

    fn spawn_particles(&mut self, at: &Location, burst: ParticleBurst) -> Result<(), HostError> {
        self.world_for(at.dimension)?;
        self.deliveries.push(Delivery::Particles { at: *at, burst });
        Ok(())
    }
}

impl TeleportHost for Server {
    fn player_name(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .map_or_else(|| player.to_string(), |online| online.name.clone())
    }

    fn player_location(&self, player: PlayerId) -> Option<Location> {
        self.players.get(&player).map(|online| online.location)
    }

    fn is_chunk_loaded(&self, dimension: DimensionId, chunk: ChunkPos) -> bool {
        self.worlds
            .get(&dimension)
            .is_some_and(|world| world.is_chunk_loaded(chunk))
    }

    fn load_chunk(&mut self, dimension: DimensionId, chunk: ChunkPos) -> Result<(), HostError> {
        let world = self
            .worlds
            .get_mut(&dimension)
            .ok_or(HostError::WorldUnavailable(dimension))?;
        world.load_chunk(chunk).map_err(|err| HostError::ChunkLoad {
            pos: chunk,
            reason: err.to_string(),
        })
    }

    fn teleport(&mut self, player: PlayerId, to: &Location) -> Result<bool, HostError> {
        let world = self.world_for(to.dimension)?;
        let (cx, cz) = to.chunk_coords();
        if !world.is_chunk_loaded(ChunkPos::new(cx, cz))
            || !world.height_bounds().contains(to.block_pos().y)
        {
            return Ok(false);
        }
        let online = self
            .players
            .get_mut(&player)
            .ok_or(HostError::PlayerOffline(player))?;
        let from = online.location;
        online.location = *to;
        self.deliveries.push(Delivery::Teleport {
            player,
            from,
            to: *to,
        });
        Ok(true)
    }
}

impl WorldAccess for Server {
    fn world_query(&self, dimension: DimensionId) -> Option<&dyn WorldQuery> {
        self.worlds
            .get(&dimension)
            .map(|world| world as &dyn WorldQuery)
    }
}

impl Permissions for Server {
    fn has_permission(&self, player: PlayerId, node: &str) -> bool {
        self.players
            .get(&player)
            .is_some_and(|online| online.permissions.contains(node))
    }
}
