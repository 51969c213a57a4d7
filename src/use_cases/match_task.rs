// The actor loop that owns one MatchCore. All mutations are serialized
// here: commands from the registry and the 1 Hz heartbeat both land in
// this task, never concurrently.

use crate::domain::ports::DataStore;
use crate::domain::{progression, PlayerId, StatDelta};
use crate::use_cases::match_core::MatchCore;
use crate::use_cases::types::{MatchCommand, MatchPhase, OutcomeEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tracing::{info, warn};

pub async fn match_task(
    mut core: MatchCore,
    mut commands: mpsc::Receiver<MatchCommand>,
    events_tx: broadcast::Sender<OutcomeEvent>,
    phase_tx: watch::Sender<MatchPhase>,
    store: Arc<dyn DataStore>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // Stat writes are fire-and-forget for the match but serialized per
    // match, so two awards to the same player cannot lose an update.
    let (stats_tx, stats_rx) = mpsc::unbounded_channel();
    tokio::spawn(stats_writer(store, stats_rx, events_tx.clone()));

    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(arena = core.arena_name(), "match task started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                core.end(None);
                flush(&mut core, &events_tx, &phase_tx, &stats_tx);
                break;
            }
            command = commands.recv() => {
                match command {
                    Some(command) => handle_command(&mut core, command),
                    None => {
                        // Registry dropped us; finish cleanly.
                        core.end(None);
                        flush(&mut core, &events_tx, &phase_tx, &stats_tx);
                        break;
                    }
                }
                flush(&mut core, &events_tx, &phase_tx, &stats_tx);
            }
            _ = interval.tick() => {
                core.tick();
                flush(&mut core, &events_tx, &phase_tx, &stats_tx);
            }
        }

        if core.phase() == MatchPhase::Retired {
            break;
        }
    }

    let _ = phase_tx.send(MatchPhase::Retired);
    info!(arena = core.arena_name(), "match retired");
}

fn handle_command(core: &mut MatchCore, command: MatchCommand) {
    match command {
        MatchCommand::Join {
            player,
            name,
            reply,
        } => {
            let _ = reply.send(core.add_player(player, name));
        }
        MatchCommand::Leave { player } => {
            if core.remove_player(player).is_err() {
                warn!(%player, arena = core.arena_name(), "leave for unknown player");
            }
        }
        MatchCommand::ForceStart => {
            if core.force_start().is_err() {
                info!(arena = core.arena_name(), "force start ignored, match already started");
            }
        }
        MatchCommand::ForceEnd => core.end(None),
        MatchCommand::PositionUpdate { player, position } => {
            core.position_update(player, position);
        }
        MatchCommand::Interact { player, position } => core.interact(player, position),
        MatchCommand::DropFlag { player } => core.drop_flag(player),
        MatchCommand::ReportDeath { player, killer } => core.report_death(player, killer),
        MatchCommand::ReportAttack { attacker } => core.report_attack(attacker),
        MatchCommand::Snapshot { reply } => {
            let _ = reply.send(core.snapshot());
        }
    }
}

/// Publish pending events, stat deltas and any phase change.
fn flush(
    core: &mut MatchCore,
    events_tx: &broadcast::Sender<OutcomeEvent>,
    phase_tx: &watch::Sender<MatchPhase>,
    stats_tx: &mpsc::UnboundedSender<(PlayerId, StatDelta)>,
) {
    for event in core.drain_events() {
        let _ = events_tx.send(event);
    }
    for delta in core.drain_stat_deltas() {
        let _ = stats_tx.send(delta);
    }
    if *phase_tx.borrow() != core.phase() {
        let _ = phase_tx.send(core.phase());
    }
}

/// Applies stat deltas to career records one at a time, emitting XP level
/// ups as they happen. Store failures are logged and skipped; match state
/// never rolls back over them.
async fn stats_writer(
    store: Arc<dyn DataStore>,
    mut deltas: mpsc::UnboundedReceiver<(PlayerId, StatDelta)>,
    events_tx: broadcast::Sender<OutcomeEvent>,
) {
    while let Some((player, delta)) = deltas.recv().await {
        let mut stats = match store.load_player_stats(player).await {
            Ok(stats) => stats,
            Err(error) => {
                warn!(%player, %error, "failed to load player stats");
                continue;
            }
        };

        let old_level = progression::level_for(stats.experience);
        delta.apply_to(&mut stats);
        let new_level = progression::level_for(stats.experience);

        for level in old_level + 1..=new_level {
            let coins = progression::level_up_coins(level);
            stats.coins = stats.coins.saturating_add(coins);
            let _ = events_tx.send(OutcomeEvent::LevelUp {
                player,
                level,
                coins,
            });
        }

        if let Err(error) = store.save_player_stats(player, &stats).await {
            warn!(%player, %error, "failed to save player stats");
        }
    }
}
