// Registry of live matches: one per arena, created on demand, retired
// through a phase watcher. Also owns the arena catalog and setup flow.

use crate::domain::ports::{DataStore, RegionGuard};
use crate::domain::{Arena, PlayerId, Position, Team};
use crate::use_cases::match_core::MatchCore;
use crate::use_cases::match_task::match_task;
use crate::use_cases::setup::{SetupError, SetupProgress, SetupSession, SetupStep};
use crate::use_cases::types::{
    EngineError, GameSettings, MatchCommand, MatchPhase, MatchSnapshot, OutcomeEvent,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, Notify, RwLock};
use tracing::{info, warn};

/// Shared wiring applied to every spawned match.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Capacity for inbound match commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast outcome events.
    pub event_broadcast_capacity: usize,
    /// Heartbeat driving clocks, countdowns and respawns.
    pub tick_interval: Duration,
    pub game: GameSettings,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            command_channel_capacity: 1024,
            event_broadcast_capacity: 128,
            tick_interval: Duration::from_secs(1),
            game: GameSettings::default(),
        }
    }
}

/// Per-match channels handed out by the registry.
#[derive(Clone)]
pub struct MatchHandle {
    pub arena_name: Arc<str>,
    commands_tx: mpsc::Sender<MatchCommand>,
    events_tx: broadcast::Sender<OutcomeEvent>,
    phase_rx: watch::Receiver<MatchPhase>,
    shutdown: Arc<Notify>,
}

impl MatchHandle {
    pub fn phase(&self) -> MatchPhase {
        *self.phase_rx.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        self.events_tx.subscribe()
    }
}

/// Thread-safe entry point for everything match-related.
pub struct MatchRegistry {
    settings: RegistrySettings,
    store: Arc<dyn DataStore>,
    guard: Arc<dyn RegionGuard>,
    /// Arena catalog keyed by lowercased name.
    arenas: RwLock<HashMap<String, Arena>>,
    /// At most one live match per arena key.
    matches: RwLock<HashMap<String, MatchHandle>>,
    /// Which arena currently holds each player.
    players: RwLock<HashMap<PlayerId, String>>,
    /// In-flight setup sessions keyed by the admin running them.
    setups: Mutex<HashMap<PlayerId, SetupSession>>,
}

impl MatchRegistry {
    pub fn new(
        settings: RegistrySettings,
        store: Arc<dyn DataStore>,
        guard: Arc<dyn RegionGuard>,
    ) -> Self {
        Self {
            settings,
            store,
            guard,
            arenas: RwLock::new(HashMap::new()),
            matches: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            setups: Mutex::new(HashMap::new()),
        }
    }

    /// Pull every persisted arena into the catalog. Called once at boot.
    pub async fn load_arenas(&self) {
        match self.store.list_arenas().await {
            Ok(list) => {
                let mut arenas = self.arenas.write().await;
                for arena in list {
                    info!(arena = %arena.name, "loaded arena");
                    arenas.insert(arena.name.to_lowercase(), arena);
                }
                info!(count = arenas.len(), "arena catalog ready");
            }
            Err(error) => warn!(%error, "failed to list arenas"),
        }
    }

    pub async fn arena(&self, name: &str) -> Option<Arena> {
        self.arenas.read().await.get(&name.to_lowercase()).cloned()
    }

    pub async fn arenas(&self) -> Vec<Arena> {
        self.arenas.read().await.values().cloned().collect()
    }

    pub async fn active_count(&self) -> usize {
        self.matches.read().await.len()
    }

    // ---- joining and leaving ----

    /// Find or create the match for `arena_name` and add the player.
    pub async fn join(
        self: &Arc<Self>,
        arena_name: &str,
        player: PlayerId,
        name: &str,
    ) -> Result<Team, EngineError> {
        if self.players.read().await.contains_key(&player) {
            return Err(EngineError::AlreadyInMatch);
        }

        let key = arena_name.to_lowercase();
        let arena = self
            .arena(&key)
            .await
            .ok_or_else(|| EngineError::ArenaNotFound {
                arena: arena_name.to_string(),
            })?;
        if !arena.enabled {
            return Err(EngineError::ArenaInvalid {
                problems: vec!["arena is disabled".to_string()],
            });
        }
        let problems = arena.validation_errors();
        if !problems.is_empty() {
            return Err(EngineError::ArenaInvalid { problems });
        }

        let handle = self.find_or_spawn_match(&key, arena).await?;

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .commands_tx
            .send(MatchCommand::Join {
                player,
                name: name.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::MatchInProgress)?;
        let team = reply_rx.await.map_err(|_| EngineError::MatchInProgress)??;

        self.players.write().await.insert(player, key.clone());
        info!(%player, arena = %key, ?team, "player joined");
        Ok(team)
    }

    /// Queue the player into any enabled arena that will take them.
    pub async fn join_random(
        self: &Arc<Self>,
        player: PlayerId,
        name: &str,
    ) -> Result<(String, Team), EngineError> {
        if self.players.read().await.contains_key(&player) {
            return Err(EngineError::AlreadyInMatch);
        }

        let candidates: Vec<String> = {
            let arenas = self.arenas.read().await;
            arenas
                .values()
                .filter(|a| a.enabled && a.is_valid())
                .map(|a| a.name.clone())
                .collect()
        };

        for arena_name in candidates {
            match self.join(&arena_name, player, name).await {
                Ok(team) => return Ok((arena_name, team)),
                Err(EngineError::AlreadyInMatch) => return Err(EngineError::AlreadyInMatch),
                Err(_) => continue,
            }
        }
        Err(EngineError::ArenaFull)
    }

    /// Remove the player from whichever match holds them.
    pub async fn leave(&self, player: PlayerId) -> Result<(), EngineError> {
        let key = self
            .players
            .write()
            .await
            .remove(&player)
            .ok_or(EngineError::NotInMatch)?;

        if let Some(handle) = self.matches.read().await.get(&key) {
            let _ = handle
                .commands_tx
                .send(MatchCommand::Leave { player })
                .await;
        }
        info!(%player, arena = %key, "player left");
        Ok(())
    }

    // ---- the event hot path ----

    /// Route a position report into the player's match. Unknown players
    /// are ignored; this path runs on every movement update.
    pub async fn position_update(&self, player: PlayerId, position: Position) {
        self.route(player, MatchCommand::PositionUpdate { player, position })
            .await;
    }

    pub async fn interact(&self, player: PlayerId, position: Position) {
        self.route(player, MatchCommand::Interact { player, position })
            .await;
    }

    pub async fn drop_flag(&self, player: PlayerId) {
        self.route(player, MatchCommand::DropFlag { player }).await;
    }

    pub async fn report_death(&self, player: PlayerId, killer: Option<PlayerId>) {
        self.route(player, MatchCommand::ReportDeath { player, killer })
            .await;
    }

    pub async fn report_attack(&self, attacker: PlayerId) {
        self.route(attacker, MatchCommand::ReportAttack { attacker })
            .await;
    }

    async fn route(&self, player: PlayerId, command: MatchCommand) {
        let key = match self.players.read().await.get(&player) {
            Some(key) => key.clone(),
            None => return,
        };
        if let Some(handle) = self.matches.read().await.get(&key) {
            let _ = handle.commands_tx.send(command).await;
        }
    }

    // ---- admin operations ----

    pub async fn force_start(&self, arena_name: &str) -> Result<(), EngineError> {
        let handle = self
            .live_match(arena_name)
            .await
            .ok_or(EngineError::InvalidTransition)?;
        handle
            .commands_tx
            .send(MatchCommand::ForceStart)
            .await
            .map_err(|_| EngineError::InvalidTransition)
    }

    pub async fn force_end(&self, arena_name: &str) -> Result<(), EngineError> {
        let handle = self
            .live_match(arena_name)
            .await
            .ok_or(EngineError::InvalidTransition)?;
        handle
            .commands_tx
            .send(MatchCommand::ForceEnd)
            .await
            .map_err(|_| EngineError::InvalidTransition)
    }

    /// Flip an arena's enabled switch. Disabling force-ends its live
    /// match.
    pub async fn set_enabled(&self, arena_name: &str, enabled: bool) -> Result<(), EngineError> {
        let key = arena_name.to_lowercase();
        let arena = {
            let mut arenas = self.arenas.write().await;
            let arena = arenas
                .get_mut(&key)
                .ok_or_else(|| EngineError::ArenaNotFound {
                    arena: arena_name.to_string(),
                })?;
            arena.enabled = enabled;
            arena.clone()
        };

        if let Err(error) = self.store.save_arena(&arena).await {
            warn!(arena = %key, %error, "failed to persist arena");
        }
        if !enabled {
            let _ = self.force_end(&key).await;
        }
        info!(arena = %key, enabled, "arena toggled");
        Ok(())
    }

    /// Force-end every live match; used at shutdown.
    pub async fn end_all(&self) {
        let handles: Vec<MatchHandle> = self.matches.read().await.values().cloned().collect();
        for handle in &handles {
            handle.shutdown.notify_one();
        }
        info!(count = handles.len(), "all matches told to end");
    }

    // ---- introspection ----

    pub async fn subscribe(&self, arena_name: &str) -> Option<broadcast::Receiver<OutcomeEvent>> {
        Some(self.live_match(arena_name).await?.subscribe())
    }

    pub async fn match_phase(&self, arena_name: &str) -> Option<MatchPhase> {
        Some(self.live_match(arena_name).await?.phase())
    }

    pub async fn snapshot(&self, arena_name: &str) -> Option<MatchSnapshot> {
        let handle = self.live_match(arena_name).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .commands_tx
            .send(MatchCommand::Snapshot { reply: reply_tx })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    pub async fn player_arena(&self, player: PlayerId) -> Option<String> {
        self.players.read().await.get(&player).cloned()
    }

    async fn live_match(&self, arena_name: &str) -> Option<MatchHandle> {
        self.matches
            .read()
            .await
            .get(&arena_name.to_lowercase())
            .cloned()
    }

    // ---- match lifecycle plumbing ----

    async fn find_or_spawn_match(
        self: &Arc<Self>,
        key: &str,
        arena: Arena,
    ) -> Result<MatchHandle, EngineError> {
        let mut matches = self.matches.write().await;

        if let Some(handle) = matches.get(key) {
            // Only a waiting match accepts more players; otherwise the
            // caller is pointed at a different arena.
            return match handle.phase() {
                MatchPhase::Waiting => Ok(handle.clone()),
                _ => Err(EngineError::MatchInProgress),
            };
        }

        let core = MatchCore::new(arena, self.settings.game.clone())?;

        let (commands_tx, commands_rx) =
            mpsc::channel::<MatchCommand>(self.settings.command_channel_capacity);
        let (events_tx, _events_rx) =
            broadcast::channel::<OutcomeEvent>(self.settings.event_broadcast_capacity);
        let (phase_tx, phase_rx) = watch::channel(MatchPhase::Waiting);
        let shutdown = Arc::new(Notify::new());

        // The actor owning all of this match's state.
        tokio::spawn(match_task(
            core,
            commands_rx,
            events_tx.clone(),
            phase_tx,
            self.store.clone(),
            self.settings.tick_interval,
            shutdown.clone(),
        ));

        let handle = MatchHandle {
            arena_name: Arc::from(key),
            commands_tx,
            events_tx,
            phase_rx: phase_rx.clone(),
            shutdown,
        };
        matches.insert(key.to_string(), handle.clone());
        drop(matches);

        self.clone().spawn_retire_watcher(key.to_string(), phase_rx);
        info!(arena = %key, "match created");
        Ok(handle)
    }

    /// Remove the match (and its player index entries) once its phase
    /// watch reports the terminal value.
    fn spawn_retire_watcher(
        self: Arc<Self>,
        key: String,
        mut phase_rx: watch::Receiver<MatchPhase>,
    ) {
        tokio::spawn(async move {
            loop {
                if *phase_rx.borrow() == MatchPhase::Retired {
                    break;
                }
                if phase_rx.changed().await.is_err() {
                    break;
                }
            }
            // Both maps clear together so a re-join cannot observe the
            // match gone while its players are still indexed.
            let mut matches = self.matches.write().await;
            let mut players = self.players.write().await;
            matches.remove(&key);
            players.retain(|_, arena| arena != &key);
            drop(players);
            drop(matches);
            info!(arena = %key, "match removed from registry");
        });
    }

    // ---- arena setup flow ----

    /// Open a setup session for a brand-new arena.
    pub async fn start_setup(
        &self,
        admin: PlayerId,
        arena_name: &str,
        world: &str,
    ) -> Result<SetupStep, SetupError> {
        let key = arena_name.to_lowercase();
        if self.arenas.read().await.contains_key(&key) {
            return Err(SetupError::ArenaExists {
                arena: arena_name.to_string(),
            });
        }

        let session = SetupSession::new(
            arena_name,
            world,
            self.settings.game.max_players_per_arena,
        );
        let step = session.step();
        self.setups.lock().await.insert(admin, session);
        info!(%admin, arena = %key, "setup started");
        Ok(step)
    }

    pub async fn setup_position(
        &self,
        admin: PlayerId,
        position: Position,
    ) -> Result<SetupStep, SetupError> {
        let mut setups = self.setups.lock().await;
        let session = setups.get_mut(&admin).ok_or(SetupError::NotInSetup)?;
        session.record_position(position);
        Ok(session.step())
    }

    /// Advance the admin's session; on completion the arena is persisted,
    /// its protection region created, and the catalog updated.
    pub async fn setup_advance(&self, admin: PlayerId) -> Result<Option<SetupStep>, SetupError> {
        let progress = {
            let mut setups = self.setups.lock().await;
            let session = setups.get_mut(&admin).ok_or(SetupError::NotInSetup)?;
            session.advance()?
        };

        match progress {
            SetupProgress::Moved(step) => Ok(Some(step)),
            SetupProgress::Complete(mut arena) => {
                self.setups.lock().await.remove(&admin);

                if let (Some(c1), Some(c2)) = (arena.corner1, arena.corner2) {
                    let region = format!("ctf_{}", arena.name.to_lowercase());
                    self.guard
                        .create_region(&region, c1, c2)
                        .map_err(|message| SetupError::Storage { message })?;
                    arena.region = Some(region);
                }
                arena.enabled = true;

                self.store
                    .save_arena(&arena)
                    .await
                    .map_err(|message| SetupError::Storage { message })?;
                info!(arena = %arena.name, "arena setup complete");
                self.arenas
                    .write()
                    .await
                    .insert(arena.name.to_lowercase(), arena);
                Ok(None)
            }
        }
    }

    pub async fn cancel_setup(&self, admin: PlayerId) -> Result<(), SetupError> {
        self.setups
            .lock()
            .await
            .remove(&admin)
            .map(|_| ())
            .ok_or(SetupError::NotInSetup)
    }
}
