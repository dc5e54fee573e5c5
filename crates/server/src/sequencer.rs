//! Delayed, multi-stage teleport.
//!
//! ```text
//! begin ── effects ──(40 ticks)──> chunk check ──loaded──────────────> execute
//!                                       │                                 ▲
//!                                       └─ load ──(5 ticks)───────────────┘
//!                                       └─ load error ──> failed
//! execute ── Ok(true) ──> completed
//!         └─ Ok(false) / Err ──> failed
//! ```
//!
//! Every path ends in exactly one terminal outcome and nothing is retried.
//! There is no cancellation: a sequence runs to completion once begun.

use std::collections::BTreeMap;

use stuck_core::{Location, PlayerId};
use stuck_world::ChunkPos;
use tracing::{error, info, warn};

use crate::effects::{ChatMessage, ParticleBurst, ParticleKind, SoundCue, Title};
use crate::host::{HostError, TeleportHost};
use crate::scheduler::Scheduler;

/// Ticks between the announcement and the chunk check (~2 s at 20 TPS).
pub const ANNOUNCE_DELAY_TICKS: u64 = 40;
/// Extra ticks granted after requesting a chunk load.
pub const CHUNK_LOAD_DELAY_TICKS: u64 = 5;

pub const SUCCESS_MESSAGE: &str = "There you go! You've been teleported to a safe location.";
pub const REFUSED_MESSAGE: &str = "Teleportation failed. Try again or contact an admin.";

/// Handle for one in-flight teleport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeleportId(pub u64);

/// Where a pending teleport is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportStage {
    /// Announced; the destination chunk has not been checked yet.
    AwaitingChunk,
    /// Chunk load requested; next step executes the move.
    Ready,
}

/// Scheduler payload resuming a pending teleport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportStep {
    pub id: TeleportId,
}

/// An announced teleport that has not reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTeleport {
    pub player: PlayerId,
    pub target: Location,
    pub stage: TeleportStage,
}

/// Terminal result of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum TeleportOutcome {
    Completed {
        player: PlayerId,
        target: Location,
    },
    Failed {
        player: PlayerId,
        target: Location,
        reason: String,
    },
}

/// Behaviour switches taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerOptions {
    /// Tell the player when the teleport succeeded.
    pub print_success_message: bool,
    /// Log failed cosmetic calls.
    pub debug: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            print_success_message: true,
            debug: false,
        }
    }
}

/// Drives pending teleports through their stages.
#[derive(Debug, Default)]
pub struct TeleportSequencer {
    options: SequencerOptions,
    pending: BTreeMap<TeleportId, PendingTeleport>,
    next_id: u64,
}

impl TeleportSequencer {
    pub fn new(options: SequencerOptions) -> Self {
        Self {
            options,
            pending: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn options(&self) -> SequencerOptions {
        self.options
    }

    /// Announce a teleport of `player` to `target` and queue the chunk check.
    pub fn begin<H, S>(
        &mut self,
        host: &mut H,
        scheduler: &mut S,
        player: PlayerId,
        target: Location,
    ) -> TeleportId
    where
        H: TeleportHost + ?Sized,
        S: Scheduler<TeleportStep> + ?Sized,
    {
        host.show_title(player, Title::escaping());
        if let Some(current) = host.player_location(player) {
            let burst = ParticleBurst::around_player(ParticleKind::Portal);
            let result = host.spawn_particles(&current.offset(0.0, 1.0, 0.0), burst);
            self.cosmetic("spawn particles", result);
            let result = host.play_sound(&current, SoundCue::ANNOUNCE);
            self.cosmetic("play sound", result);
        }

        let id = TeleportId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            PendingTeleport {
                player,
                target,
                stage: TeleportStage::AwaitingChunk,
            },
        );
        scheduler.schedule_after(ANNOUNCE_DELAY_TICKS, TeleportStep { id });
        id
    }

    /// Continue a sequence whose step became due.
    ///
    /// Returns the outcome once the sequence reaches a terminal state.
    pub fn resume<H, S>(
        &mut self,
        step: TeleportStep,
        host: &mut H,
        scheduler: &mut S,
    ) -> Option<TeleportOutcome>
    where
        H: TeleportHost + ?Sized,
        S: Scheduler<TeleportStep> + ?Sized,
    {
        let Some(mut pending) = self.pending.remove(&step.id) else {
            warn!(id = step.id.0, "resumed unknown teleport");
            return None;
        };

        match pending.stage {
            TeleportStage::AwaitingChunk => {
                let target = pending.target;
                let (cx, cz) = target.chunk_coords();
                let chunk = ChunkPos::new(cx, cz);
                if host.is_chunk_loaded(target.dimension, chunk) {
                    return Some(self.execute(pending, host));
                }
                match host.load_chunk(target.dimension, chunk) {
                    Ok(()) => {
                        pending.stage = TeleportStage::Ready;
                        self.pending.insert(step.id, pending);
                        scheduler.schedule_after(CHUNK_LOAD_DELAY_TICKS, step);
                        None
                    }
                    Err(err) => Some(self.fail(
                        pending,
                        host,
                        format!("An error occurred while preparing the destination: {err}"),
                        &err,
                    )),
                }
            }
            TeleportStage::Ready => Some(self.execute(pending, host)),
        }
    }

    /// Pending teleports in announcement order.
    pub fn pending(&self) -> impl Iterator<Item = (TeleportId, &PendingTeleport)> + '_ {
        self.pending.iter().map(|(id, pending)| (*id, pending))
    }

    /// Number of sequences still running for `player`.
    pub fn pending_for(&self, player: PlayerId) -> usize {
        self.pending
            .values()
            .filter(|pending| pending.player == player)
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    fn execute<H>(&self, pending: PendingTeleport, host: &mut H) -> TeleportOutcome
    where
        H: TeleportHost + ?Sized,
    {
        match host.teleport(pending.player, &pending.target) {
            Ok(true) => self.complete(pending, host),
            Ok(false) => self.fail(
                pending,
                host,
                REFUSED_MESSAGE.to_string(),
                &HostError::Other("teleport refused by host".to_string()),
            ),
            Err(err) => self.fail(
                pending,
                host,
                format!("An error occurred during teleportation: {err}"),
                &err,
            ),
        }
    }

    fn complete<H>(&self, pending: PendingTeleport, host: &mut H) -> TeleportOutcome
    where
        H: TeleportHost + ?Sized,
    {
        let PendingTeleport { player, target, .. } = pending;
        let result = host.play_sound(&target, SoundCue::ARRIVE);
        self.cosmetic("play sound", result);
        let burst = ParticleBurst::around_player(ParticleKind::EndRod);
        let result = host.spawn_particles(&target.offset(0.0, 1.0, 0.0), burst);
        self.cosmetic("spawn particles", result);
        if self.options.print_success_message {
            host.send_message(player, ChatMessage::success(SUCCESS_MESSAGE));
        }
        if self.options.debug {
            info!("Teleported {} to {}", host.player_name(player), target);
        }
        TeleportOutcome::Completed { player, target }
    }

    fn fail<H>(
        &self,
        pending: PendingTeleport,
        host: &mut H,
        message: String,
        cause: &HostError,
    ) -> TeleportOutcome
    where
        H: TeleportHost + ?Sized,
    {
        let PendingTeleport { player, target, .. } = pending;
        host.send_message(player, ChatMessage::error(message));
        error!(
            "Teleport failed for {} to {} at {}, {}, {}: {cause}",
            host.player_name(player),
            target.dimension,
            target.x,
            target.y,
            target.z
        );
        TeleportOutcome::Failed {
            player,
            target,
            reason: cause.to_string(),
        }
    }

    fn cosmetic(&self, what: &str, result: Result<(), HostError>) {
        if let Err(err) = result {
            if self.options.debug {
                warn!("Failed to {what}: {err}");
            }
        }
    }
}
