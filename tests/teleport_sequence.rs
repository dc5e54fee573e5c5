use stuck_core::{DimensionId, Location, PlayerId, SimTick};
use stuck_server::sequencer::{
    ANNOUNCE_DELAY_TICKS, CHUNK_LOAD_DELAY_TICKS, REFUSED_MESSAGE, SUCCESS_MESSAGE,
};
use stuck_server::{
    ParticleKind, Scheduler, SequencerOptions, SoundCue, TeleportHost, TeleportOutcome,
    TeleportSequencer, TeleportStep, TickScheduler, Tone,
};
use stuck_testkit::{flat_world, load_around, LogCapture, RecordingHost, TeleportFault};
use stuck_world::ChunkPos;
use tracing::Level;

const STEVE: PlayerId = PlayerId::from_u128(0x5_7E7E);

fn spawn() -> Location {
    Location::new(DimensionId::Overworld, 0.5, 40.0, 0.5)
}

fn host() -> RecordingHost {
    let mut world = flat_world(DimensionId::Overworld, 64, "GRASS_BLOCK").expect("world");
    load_around(&mut world, &spawn(), 1).expect("spawn area");
    let mut host = RecordingHost::with_world(world);
    host.join(STEVE, "Steve", spawn(), &[]);
    host
}

/// Run until idle, recording the tick each outcome landed on.
fn settle(
    sequencer: &mut TeleportSequencer,
    host: &mut RecordingHost,
    scheduler: &mut TickScheduler<TeleportStep>,
) -> Vec<(SimTick, TeleportOutcome)> {
    let mut outcomes = Vec::new();
    while !scheduler.is_idle() {
        for step in scheduler.advance() {
            if let Some(outcome) = sequencer.resume(step, host, scheduler) {
                outcomes.push((scheduler.now(), outcome));
            }
        }
    }
    outcomes
}

#[test]
fn resident_destination_completes_at_forty_ticks() {
    let mut host = host();
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 3.5, 64.0, -2.5);

    sequencer.begin(&mut host, &mut scheduler, STEVE, target);
    let outcomes = settle(&mut sequencer, &mut host, &mut scheduler);

    assert_eq!(
        outcomes,
        vec![(
            SimTick(ANNOUNCE_DELAY_TICKS),
            TeleportOutcome::Completed {
                player: STEVE,
                target
            }
        )]
    );
    assert!(host.load_requests().is_empty());
    assert_eq!(host.teleports(), vec![(STEVE, target)]);

    let titles = host.titles(STEVE);
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].title, "Escaping...");
    assert_eq!(titles[0].subtitle, "Hold tight!");

    let sounds = host.sounds();
    assert_eq!(sounds, vec![(spawn(), SoundCue::ANNOUNCE), (target, SoundCue::ARRIVE)]);

    let particles = host.particles();
    assert_eq!(particles.len(), 2);
    assert_eq!(particles[0].0, spawn().offset(0.0, 1.0, 0.0));
    assert_eq!(particles[0].1.kind, ParticleKind::Portal);
    assert_eq!(particles[1].0, target.offset(0.0, 1.0, 0.0));
    assert_eq!(particles[1].1.kind, ParticleKind::EndRod);
    assert_eq!(particles[1].1.count, 50);

    assert_eq!(host.texts(STEVE, Tone::Success), vec![SUCCESS_MESSAGE]);
    assert!(host.texts(STEVE, Tone::Error).is_empty());
}

#[test]
fn unloaded_destination_is_loaded_then_entered_five_ticks_later() {
    let mut host = host();
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 200.5, 64.0, 200.5);

    sequencer.begin(&mut host, &mut scheduler, STEVE, target);
    let outcomes = settle(&mut sequencer, &mut host, &mut scheduler);

    assert_eq!(
        host.load_requests(),
        &[(DimensionId::Overworld, ChunkPos::new(12, 12))]
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].0,
        SimTick(ANNOUNCE_DELAY_TICKS + CHUNK_LOAD_DELAY_TICKS)
    );
    assert!(matches!(outcomes[0].1, TeleportOutcome::Completed { .. }));
    assert_eq!(host.server.player_location(STEVE), Some(target));
}

#[test]
fn host_reporting_no_resident_chunks_still_gets_a_load_and_delay() {
    let mut host = host();
    host.faults.chunks_never_loaded = true;
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 3.5, 64.0, -2.5);

    sequencer.begin(&mut host, &mut scheduler, STEVE, target);
    assert!(scheduler.advance_by(ANNOUNCE_DELAY_TICKS - 1).is_empty());
    let due = scheduler.advance();
    assert_eq!(due.len(), 1);
    assert_eq!(sequencer.resume(due[0], &mut host, &mut scheduler), None);
    assert_eq!(
        host.load_requests(),
        &[(DimensionId::Overworld, ChunkPos::new(0, -1))]
    );
    assert!(host.teleport_attempts().is_empty());

    let outcomes = settle(&mut sequencer, &mut host, &mut scheduler);
    assert_eq!(
        outcomes,
        vec![(
            SimTick(ANNOUNCE_DELAY_TICKS + CHUNK_LOAD_DELAY_TICKS),
            TeleportOutcome::Completed {
                player: STEVE,
                target
            }
        )]
    );
    assert_eq!(host.load_requests().len(), 1);
    assert_eq!(host.teleports(), vec![(STEVE, target)]);
}

fn assert_single_failure(host: &RecordingHost, logs: &LogCapture, expected_message: &str) {
    let errors = host.texts(STEVE, Tone::Error);
    assert_eq!(errors, vec![expected_message.to_string()]);
    assert!(host.texts(STEVE, Tone::Success).is_empty());

    let logged = logs.messages(Level::ERROR);
    assert_eq!(logged.len(), 1, "{logged:?}");
    assert!(
        logged[0].starts_with("Teleport failed for Steve to overworld at "),
        "{}",
        logged[0]
    );
}

#[test]
fn chunk_load_error_fails_once() {
    let logs = LogCapture::new();
    let mut host = host();
    host.faults.load_chunk = Some("region file corrupt".into());
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 200.5, 64.0, 200.5);

    let outcomes = logs.capture(|| {
        sequencer.begin(&mut host, &mut scheduler, STEVE, target);
        settle(&mut sequencer, &mut host, &mut scheduler)
    });

    assert!(matches!(
        &outcomes[..],
        [(tick, TeleportOutcome::Failed { reason, .. })]
            if *tick == SimTick(ANNOUNCE_DELAY_TICKS) && reason.contains("region file corrupt")
    ));
    assert!(host.teleport_attempts().is_empty());
    assert_single_failure(
        &host,
        &logs,
        "An error occurred while preparing the destination: \
         could not load chunk (12, 12): region file corrupt",
    );
    assert!(sequencer.is_idle());
}

#[test]
fn refused_teleport_fails_once() {
    let logs = LogCapture::new();
    let mut host = host();
    host.faults.teleport = TeleportFault::Refuse;
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 3.5, 64.0, 3.5);

    let outcomes = logs.capture(|| {
        sequencer.begin(&mut host, &mut scheduler, STEVE, target);
        settle(&mut sequencer, &mut host, &mut scheduler)
    });

    assert!(matches!(&outcomes[..], [(_, TeleportOutcome::Failed { .. })]));
    assert_eq!(host.teleport_attempts(), &[(STEVE, target)]);
    assert!(host.teleports().is_empty());
    assert_single_failure(&host, &logs, REFUSED_MESSAGE);
    // No arrival effects after a failure.
    assert_eq!(host.sounds(), vec![(spawn(), SoundCue::ANNOUNCE)]);
}

#[test]
fn teleport_error_fails_once_with_reason() {
    let logs = LogCapture::new();
    let mut host = host();
    host.faults.teleport = TeleportFault::Error("player is riding a minecart".into());
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let target = Location::new(DimensionId::Overworld, 3.5, 64.0, 3.5);

    logs.capture(|| {
        sequencer.begin(&mut host, &mut scheduler, STEVE, target);
        settle(&mut sequencer, &mut host, &mut scheduler)
    });

    assert_single_failure(
        &host,
        &logs,
        "An error occurred during teleportation: player is riding a minecart",
    );
    assert!(logs.messages(Level::ERROR)[0].ends_with("player is riding a minecart"));
}

#[test]
fn cosmetic_failures_never_change_the_outcome() {
    for debug in [false, true] {
        let logs = LogCapture::new();
        let mut host = host();
        host.faults.cosmetics = true;
        let mut scheduler = TickScheduler::new();
        let mut sequencer = TeleportSequencer::new(SequencerOptions {
            print_success_message: true,
            debug,
        });
        let target = Location::new(DimensionId::Overworld, 3.5, 64.0, 3.5);

        let outcomes = logs.capture(|| {
            sequencer.begin(&mut host, &mut scheduler, STEVE, target);
            settle(&mut sequencer, &mut host, &mut scheduler)
        });

        assert!(matches!(&outcomes[..], [(_, TeleportOutcome::Completed { .. })]));
        assert_eq!(host.texts(STEVE, Tone::Success), vec![SUCCESS_MESSAGE]);
        assert!(host.sounds().is_empty());
        let expected_warnings = if debug { 4 } else { 0 };
        assert_eq!(logs.count(Level::WARN), expected_warnings, "debug={debug}");
    }
}

#[test]
fn concurrent_players_are_sequenced_independently() {
    let alex = PlayerId::from_u128(0xA1E);
    let mut host = host();
    host.join(alex, "Alex", spawn(), &[]);
    let mut scheduler = TickScheduler::new();
    let mut sequencer = TeleportSequencer::default();
    let near = Location::new(DimensionId::Overworld, 3.5, 64.0, 3.5);
    let far = Location::new(DimensionId::Overworld, -100.5, 64.0, 7.5);

    sequencer.begin(&mut host, &mut scheduler, STEVE, far);
    scheduler.advance_by(3);
    sequencer.begin(&mut host, &mut scheduler, alex, near);
    assert_eq!(scheduler.pending(), 2);

    let outcomes = settle(&mut sequencer, &mut host, &mut scheduler);
    let ticks: Vec<u64> = outcomes.iter().map(|(tick, _)| tick.0).collect();
    assert_eq!(ticks, vec![43, 45]);
    assert_eq!(host.server.player_location(alex), Some(near));
    assert_eq!(host.server.player_location(STEVE), Some(far));
}
