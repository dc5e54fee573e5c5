use std::fmt;

use rand::rngs::StdRng;
use stuck_core::{Location, PlayerId};
use stuck_server::{
    ChatMessage, Clock, CooldownLedger, Permissions, Scheduler, TeleportHost, TeleportId,
    TeleportOutcome, TeleportSequencer, TeleportStep, WorldAccess,
};
use stuck_world::{find_safe_location, SearchOutcome, SearchSettings};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::StuckConfig;

/// Permission node required to run the command.
pub const PERMISSION_NODE: &str = "stuck.use";

pub const PLAYERS_ONLY_MESSAGE: &str = "Only players can use this command.";
pub const NO_PERMISSION_MESSAGE: &str = "You don't have permission to use this command.";
pub const NO_WORLD_MESSAGE: &str = "Error: Could not determine your current world.";
pub const SEARCHING_MESSAGE: &str = "Searching for a safe location...";
pub const NOT_FOUND_MESSAGE: &str =
    "Could not find a safe location. Please try again or contact an admin.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Missing command")]
    Missing,
    #[error("Unknown command: {0}. Try /stuck")]
    Unknown(String),
}

/// Names the command answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Stuck,
    Escape,
}

impl Alias {
    pub fn as_str(self) -> &'static str {
        match self {
            Alias::Stuck => "stuck",
            Alias::Escape => "escape",
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSender {
    Console,
    Player(PlayerId),
}

/// Resolve a command line to an alias. Arguments are accepted and ignored.
pub fn parse_command(input: &str) -> Result<Alias, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input).trim();
    let cmd = input
        .split_whitespace()
        .next()
        .ok_or(CommandError::Missing)?
        .to_ascii_lowercase();

    match cmd.as_str() {
        "stuck" => Ok(Alias::Stuck),
        "escape" => Ok(Alias::Escape),
        _ => Err(CommandError::Unknown(cmd)),
    }
}

/// Everything the handler needs from the hosting server.
pub trait CommandHost: TeleportHost + Permissions + WorldAccess {}

impl<T: TeleportHost + Permissions + WorldAccess + ?Sized> CommandHost for T {}

/// How a single invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Issued from the console; the reply is for the console to print.
    PlayersOnly(ChatMessage),
    NoPermission,
    OnCooldown { remaining_secs: i64 },
    NoWorld,
    NotFound { attempts: u32 },
    /// A teleport sequence was started.
    Teleporting { id: TeleportId, target: Location },
}

/// Stateful `/stuck` handler: owns the cooldown ledger and the in-flight
/// teleports.
pub struct StuckHandler<C> {
    config: StuckConfig,
    settings: SearchSettings,
    ledger: CooldownLedger,
    sequencer: TeleportSequencer,
    rng: StdRng,
    clock: C,
}

impl<C: Clock> StuckHandler<C> {
    pub fn new(config: StuckConfig, clock: C, rng: StdRng) -> Self {
        let config = config.validated();
        Self {
            settings: config.search_settings(),
            sequencer: TeleportSequencer::new(config.sequencer_options()),
            config,
            ledger: CooldownLedger::new(),
            rng,
            clock,
        }
    }

    pub fn config(&self) -> &StuckConfig {
        &self.config
    }

    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn sequencer(&self) -> &TeleportSequencer {
        &self.sequencer
    }

    pub fn execute<H, S>(
        &mut self,
        alias: Alias,
        sender: CommandSender,
        host: &mut H,
        scheduler: &mut S,
    ) -> Dispatch
    where
        H: CommandHost + ?Sized,
        S: Scheduler<TeleportStep> + ?Sized,
    {
        if self.config.debug {
            info!("Command executed with alias: {alias}");
        }

        let player = match sender {
            CommandSender::Console => {
                return Dispatch::PlayersOnly(ChatMessage::error(PLAYERS_ONLY_MESSAGE))
            }
            CommandSender::Player(player) => player,
        };

        if !host.has_permission(player, PERMISSION_NODE) {
            host.send_message(player, ChatMessage::error(NO_PERMISSION_MESSAGE));
            return Dispatch::NoPermission;
        }

        let now = self.clock.now_millis();
        if let Some(remaining_secs) =
            self.ledger
                .remaining_secs(player, now, self.config.cooldown_secs())
        {
            host.send_message(
                player,
                ChatMessage::error(format!(
                    "Please wait {remaining_secs} seconds before using this command again."
                )),
            );
            return Dispatch::OnCooldown { remaining_secs };
        }

        let name = host.player_name(player);
        let origin = host
            .player_location(player)
            .filter(|origin| host.world_query(origin.dimension).is_some());
        let Some(origin) = origin else {
            host.send_message(player, ChatMessage::error(NO_WORLD_MESSAGE));
            warn!("Could not determine world for player {name}");
            return Dispatch::NoWorld;
        };
        host.send_message(player, ChatMessage::notice(SEARCHING_MESSAGE));

        let Some(world) = host.world_query(origin.dimension) else {
            return Dispatch::NoWorld;
        };
        let outcome = find_safe_location(world, &origin, &self.settings, &mut self.rng);
        let world_name = world.name().to_string();

        match outcome {
            SearchOutcome::Found { location, attempts } => {
                self.ledger.commit(player, now);
                if self.config.debug {
                    info!(
                        "Found safe location for {name} at {location} after {attempts} attempts"
                    );
                }
                let id = self.sequencer.begin(host, scheduler, player, location);
                Dispatch::Teleporting {
                    id,
                    target: location,
                }
            }
            SearchOutcome::NotFound { attempts } => {
                host.send_message(player, ChatMessage::error(NOT_FOUND_MESSAGE));
                warn!("Failed to find safe location for {name} in world {world_name}");
                Dispatch::NotFound { attempts }
            }
        }
    }

    /// Feed steps that became due this tick to the teleport sequencer.
    pub fn on_tick<H, S>(
        &mut self,
        due: Vec<TeleportStep>,
        host: &mut H,
        scheduler: &mut S,
    ) -> Vec<TeleportOutcome>
    where
        H: CommandHost + ?Sized,
        S: Scheduler<TeleportStep> + ?Sized,
    {
        due.into_iter()
            .filter_map(|step| self.sequencer.resume(step, host, scheduler))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use stuck_core::{BlockPos, DimensionId, HeightBounds};
    use stuck_server::{HostError, Messenger, ParticleBurst, SoundCue, TickScheduler, Title, Tone};
    use stuck_testkit::ManualClock;
    use stuck_world::{BlockSample, ChunkPos, WorldError, WorldQuery};

    /// A world that is solid stone below y=64 and air above, everywhere.
    struct Plain;

    impl WorldQuery for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn dimension(&self) -> DimensionId {
            DimensionId::Overworld
        }

        fn height_bounds(&self) -> HeightBounds {
            HeightBounds::new(0, 128)
        }

        fn block_at(&self, pos: BlockPos) -> Result<BlockSample<'_>, WorldError> {
            Ok(if pos.y < 64 {
                BlockSample {
                    material: "STONE",
                    solid: true,
                    liquid: false,
                }
            } else {
                BlockSample {
                    material: "AIR",
                    solid: false,
                    liquid: false,
                }
            })
        }
    }

    #[derive(Default)]
    struct FakeHost {
        world: Option<Plain>,
        location: Option<Location>,
        permitted: HashSet<PlayerId>,
        messages: Vec<(PlayerId, ChatMessage)>,
        titles: usize,
    }

    impl Messenger for FakeHost {
        fn send_message(&mut self, player: PlayerId, message: ChatMessage) {
            self.messages.push((player, message));
        }

        fn show_title(&mut self, _player: PlayerId, _title: Title) {
            self.titles += 1;
        }

        fn play_sound(&mut self, _at: &Location, _cue: SoundCue) -> Result<(), HostError> {
            Ok(())
        }

        fn spawn_particles(
            &mut self,
            _at: &Location,
            _burst: ParticleBurst,
        ) -> Result<(), HostError> {
            Ok(())
        }
    }

    impl TeleportHost for FakeHost {
        fn player_name(&self, _player: PlayerId) -> String {
            "Alex".into()
        }

        fn player_location(&self, _player: PlayerId) -> Option<Location> {
            self.location
        }

        fn is_chunk_loaded(&self, _dimension: DimensionId, _chunk: ChunkPos) -> bool {
            true
        }

        fn load_chunk(
            &mut self,
            _dimension: DimensionId,
            _chunk: ChunkPos,
        ) -> Result<(), HostError> {
            Ok(())
        }

        fn teleport(&mut self, _player: PlayerId, to: &Location) -> Result<bool, HostError> {
            self.location = Some(*to);
            Ok(true)
        }
    }

    impl Permissions for FakeHost {
        fn has_permission(&self, player: PlayerId, node: &str) -> bool {
            node == PERMISSION_NODE && self.permitted.contains(&player)
        }
    }

    impl WorldAccess for FakeHost {
        fn world_query(&self, _dimension: DimensionId) -> Option<&dyn WorldQuery> {
            self.world.as_ref().map(|world| world as &dyn WorldQuery)
        }
    }

    const ALEX: PlayerId = PlayerId::from_u128(0xA1E);

    fn host() -> FakeHost {
        FakeHost {
            world: Some(Plain),
            location: Some(Location::new(DimensionId::Overworld, 0.5, 64.0, 0.5)),
            permitted: HashSet::from([ALEX]),
            ..Default::default()
        }
    }

    fn handler(clock: &ManualClock) -> StuckHandler<ManualClock> {
        StuckHandler::new(StuckConfig::default(), clock.clone(), StdRng::seed_from_u64(7))
    }

    fn texts(host: &FakeHost) -> Vec<&str> {
        host.messages
            .iter()
            .map(|(_, message)| message.text.as_str())
            .collect()
    }

    #[test]
    fn parses_both_aliases_case_insensitively() {
        assert_eq!(parse_command("/stuck"), Ok(Alias::Stuck));
        assert_eq!(parse_command("ESCAPE"), Ok(Alias::Escape));
        assert_eq!(parse_command("  /Stuck please help "), Ok(Alias::Stuck));
        assert_eq!(parse_command("/"), Err(CommandError::Missing));
        assert_eq!(
            parse_command("/tp 1 2 3"),
            Err(CommandError::Unknown("tp".into()))
        );
    }

    #[test]
    fn console_is_rejected_before_anything_else() {
        let clock = ManualClock::at(0);
        let mut handler = handler(&clock);
        let mut host = host();
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Stuck,
            CommandSender::Console,
            &mut host,
            &mut scheduler,
        );
        assert_eq!(
            dispatch,
            Dispatch::PlayersOnly(ChatMessage::error(PLAYERS_ONLY_MESSAGE))
        );
        assert!(host.messages.is_empty());
    }

    #[test]
    fn missing_permission_is_reported() {
        let clock = ManualClock::at(0);
        let mut handler = handler(&clock);
        let mut host = FakeHost {
            permitted: HashSet::new(),
            ..host()
        };
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Stuck,
            CommandSender::Player(ALEX),
            &mut host,
            &mut scheduler,
        );
        assert_eq!(dispatch, Dispatch::NoPermission);
        assert_eq!(texts(&host), vec![NO_PERMISSION_MESSAGE]);
        assert!(handler.ledger().is_empty());
    }

    #[test]
    fn success_commits_cooldown_and_starts_teleport() {
        let clock = ManualClock::at(1_000_000);
        let mut handler = handler(&clock);
        let mut host = host();
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Escape,
            CommandSender::Player(ALEX),
            &mut host,
            &mut scheduler,
        );
        let Dispatch::Teleporting { target, .. } = dispatch else {
            panic!("expected a teleport, got {dispatch:?}");
        };
        assert_eq!(target.y, 64.0);
        assert_eq!(handler.ledger().last_use(ALEX), Some(1_000_000));
        assert_eq!(host.titles, 1);
        assert_eq!(texts(&host), vec![SEARCHING_MESSAGE]);

        let mut outcomes = Vec::new();
        while !scheduler.is_idle() {
            let due = scheduler.advance();
            outcomes.extend(handler.on_tick(due, &mut host, &mut scheduler));
        }
        assert_eq!(outcomes.len(), 1);
        assert_eq!(host.location, Some(target));
        assert_eq!(host.messages.last().map(|(_, m)| m.tone), Some(Tone::Success));
    }

    /// Moves forward 700 ms every time it is read.
    struct SteppingClock(std::cell::Cell<i64>);

    impl Clock for SteppingClock {
        fn now_millis(&self) -> i64 {
            let now = self.0.get();
            self.0.set(now + 700);
            now
        }
    }

    #[test]
    fn cooldown_is_stamped_with_the_gate_time() {
        let clock = SteppingClock(std::cell::Cell::new(5_000));
        let mut handler =
            StuckHandler::new(StuckConfig::default(), clock, StdRng::seed_from_u64(7));
        let mut host = host();
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Stuck,
            CommandSender::Player(ALEX),
            &mut host,
            &mut scheduler,
        );
        assert!(matches!(dispatch, Dispatch::Teleporting { .. }));
        assert_eq!(handler.ledger().last_use(ALEX), Some(5_000));
    }

    #[test]
    fn second_use_inside_window_is_rejected() {
        let clock = ManualClock::at(0);
        let mut handler = handler(&clock);
        let mut host = host();
        let mut scheduler = TickScheduler::new();
        let alex = CommandSender::Player(ALEX);

        assert!(matches!(
            handler.execute(Alias::Stuck, alex, &mut host, &mut scheduler),
            Dispatch::Teleporting { .. }
        ));

        clock.set(10_500);
        assert_eq!(
            handler.execute(Alias::Stuck, alex, &mut host, &mut scheduler),
            Dispatch::OnCooldown { remaining_secs: 19 }
        );
        assert_eq!(
            texts(&host).last(),
            Some(&"Please wait 19 seconds before using this command again.")
        );
        assert_eq!(handler.sequencer().pending_for(ALEX), 1);

        clock.set(30_000);
        assert!(matches!(
            handler.execute(Alias::Stuck, alex, &mut host, &mut scheduler),
            Dispatch::Teleporting { .. }
        ));
    }

    #[test]
    fn missing_world_is_reported() {
        let clock = ManualClock::at(0);
        let mut handler = handler(&clock);
        let mut host = FakeHost {
            world: None,
            ..host()
        };
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Stuck,
            CommandSender::Player(ALEX),
            &mut host,
            &mut scheduler,
        );
        assert_eq!(dispatch, Dispatch::NoWorld);
        assert_eq!(texts(&host).last(), Some(&NO_WORLD_MESSAGE));
        assert!(handler.ledger().is_empty());
    }

    #[test]
    fn exhausted_search_leaves_ledger_untouched() {
        let clock = ManualClock::at(0);
        let config = StuckConfig {
            min_y: 100,
            max_y: 110,
            max_attempts: 4,
            ..StuckConfig::default()
        };
        let mut handler = StuckHandler::new(config, clock, StdRng::seed_from_u64(1));
        let mut host = host();
        let mut scheduler = TickScheduler::new();

        let dispatch = handler.execute(
            Alias::Stuck,
            CommandSender::Player(ALEX),
            &mut host,
            &mut scheduler,
        );
        assert_eq!(dispatch, Dispatch::NotFound { attempts: 4 });
        assert_eq!(texts(&host), vec![SEARCHING_MESSAGE, NOT_FOUND_MESSAGE]);
        assert!(handler.ledger().is_empty());
        assert!(scheduler.is_idle());
        assert_eq!(handler.config().max_attempts, 4);
    }
}
