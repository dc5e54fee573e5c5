//! A headless host that records everything and fails on demand.

use stuck_core::{DimensionId, Location, PlayerId};
use stuck_server::{
    ChatMessage, Delivery, HostError, Messenger, OnlinePlayer, ParticleBurst, Permissions,
    Server, SoundCue, TeleportHost, Title, Tone, WorldAccess,
};
use stuck_world::{ChunkPos, VoxelWorld, WorldQuery};

/// How [`RecordingHost::teleport`] should misbehave.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeleportFault {
    /// Delegate to the wrapped server.
    #[default]
    None,
    /// Report `Ok(false)`.
    Refuse,
    /// Report an error carrying this reason.
    Error(String),
}

/// Faults injected into host calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Faults {
    /// Make `load_chunk` fail with this reason.
    pub load_chunk: Option<String>,
    /// Override the result of `teleport`.
    pub teleport: TeleportFault,
    /// Make sound and particle calls fail.
    pub cosmetics: bool,
    /// Report every chunk as not resident.
    pub chunks_never_loaded: bool,
}

/// [`Server`] wrapper used by integration tests.
///
/// Every call is delegated to the wrapped server unless a [`Faults`] entry
/// says otherwise; `load_chunk` and `teleport` calls are counted either way.
#[derive(Default)]
pub struct RecordingHost {
    /// Wrapped host state.
    pub server: Server,
    /// Active faults.
    pub faults: Faults,
    load_requests: Vec<(DimensionId, ChunkPos)>,
    teleport_attempts: Vec<(PlayerId, Location)>,
}

impl RecordingHost {
    /// Host with a single world and no players.
    pub fn with_world(world: VoxelWorld) -> Self {
        let mut server = Server::new();
        server.add_world(world);
        Self {
            server,
            ..Self::default()
        }
    }

    /// Add an online player holding the listed permission nodes.
    pub fn join(&mut self, id: PlayerId, name: &str, at: Location, permissions: &[&str]) {
        let player = permissions
            .iter()
            .fold(OnlinePlayer::new(name, at), |player, node| {
                player.with_permission(*node)
            });
        self.server.join(id, player);
    }

    /// World registered for `dimension`.
    pub fn world(&self, dimension: DimensionId) -> Option<&VoxelWorld> {
        self.server.world(dimension)
    }

    /// Mutable world registered for `dimension`.
    pub fn world_mut(&mut self, dimension: DimensionId) -> Option<&mut VoxelWorld> {
        self.server.world_mut(dimension)
    }

    /// Chat lines sent to `player`.
    pub fn messages(&self, player: PlayerId) -> Vec<ChatMessage> {
        self.server.messages_for(player).cloned().collect()
    }

    /// Chat texts sent to `player` with the given tone.
    pub fn texts(&self, player: PlayerId, tone: Tone) -> Vec<String> {
        self.server
            .messages_for(player)
            .filter(|message| message.tone == tone)
            .map(|message| message.text.clone())
            .collect()
    }

    /// Titles shown to `player`.
    pub fn titles(&self, player: PlayerId) -> Vec<Title> {
        self.deliveries()
            .iter()
            .filter_map(|delivery| match delivery {
                Delivery::Title { player: to, title } if *to == player => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    /// Sounds played, in order.
    pub fn sounds(&self) -> Vec<(Location, SoundCue)> {
        self.deliveries()
            .iter()
            .filter_map(|delivery| match delivery {
                Delivery::Sound { at, cue } => Some((*at, *cue)),
                _ => None,
            })
            .collect()
    }

    /// Particle bursts spawned, in order.
    pub fn particles(&self) -> Vec<(Location, ParticleBurst)> {
        self.deliveries()
            .iter()
            .filter_map(|delivery| match delivery {
                Delivery::Particles { at, burst } => Some((*at, *burst)),
                _ => None,
            })
            .collect()
    }

    /// Successful moves as `(player, destination)`.
    pub fn teleports(&self) -> Vec<(PlayerId, Location)> {
        self.deliveries()
            .iter()
            .filter_map(|delivery| match delivery {
                Delivery::Teleport { player, to, .. } => Some((*player, *to)),
                _ => None,
            })
            .collect()
    }

    /// Every chunk load request, including failed ones.
    pub fn load_requests(&self) -> &[(DimensionId, ChunkPos)] {
        &self.load_requests
    }

    /// Every teleport call, including refused and failed ones.
    pub fn teleport_attempts(&self) -> &[(PlayerId, Location)] {
        &self.teleport_attempts
    }

    /// Raw delivery log of the wrapped server.
    pub fn deliveries(&self) -> &[Delivery] {
        self.server.deliveries()
    }
}

impl Messenger for RecordingHost {
    fn send_message(&mut self, player: PlayerId, message: ChatMessage) {
        self.server.send_message(player, message);
    }

    fn show_title(&mut self, player: PlayerId, title: Title) {
        self.server.show_title(player, title);
    }

    fn play_sound(&mut self, at: &Location, cue: SoundCue) -> Result<(), HostError> {
        if self.faults.cosmetics {
            return Err(HostError::Other("sound backend offline".into()));
        }
        self.server.play_sound(at, cue)
    }

    fn spawn_particles(&mut self, at: &Location, burst: ParticleBurst) -> Result<(), HostError> {
        if self.faults.cosmetics {
            return Err(HostError::Other("particle backend offline".into()));
        }
        self.server.spawn_particles(at, burst)
    }
}

impl TeleportHost for RecordingHost {
    fn player_name(&self, player: PlayerId) -> String {
        self.server.player_name(player)
    }

    fn player_location(&self, player: PlayerId) -> Option<Location> {
        self.server.player_location(player)
    }

    fn is_chunk_loaded(&self, dimension: DimensionId, chunk: ChunkPos) -> bool {
        !self.faults.chunks_never_loaded && self.server.is_chunk_loaded(dimension, chunk)
    }

    fn load_chunk(&mut self, dimension: DimensionId, chunk: ChunkPos) -> Result<(), HostError> {
        self.load_requests.push((dimension, chunk));
        if let Some(reason) = &self.faults.load_chunk {
            return Err(HostError::ChunkLoad {
                pos: chunk,
                reason: reason.clone(),
            });
        }
        self.server.load_chunk(dimension, chunk)
    }

    fn teleport(&mut self, player: PlayerId, to: &Location) -> Result<bool, HostError> {
        self.teleport_attempts.push((player, *to));
        match &self.faults.teleport {
            TeleportFault::None => self.server.teleport(player, to),
            TeleportFault::Refuse => Ok(false),
            TeleportFault::Error(reason) => Err(HostError::Other(reason.clone())),
        }
    }
}

impl WorldAccess for RecordingHost {
    fn world_query(&self, dimension: DimensionId) -> Option<&dyn WorldQuery> {
        self.server.world_query(dimension)
    }
}

impl Permissions for RecordingHost {
    fn has_permission(&self, player: PlayerId, node: &str) -> bool {
        self.server.has_permission(player, node)
    }
}
