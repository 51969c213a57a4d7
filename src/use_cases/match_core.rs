// The match state machine. One instance per live match, owned exclusively
// by its actor task; every mutation comes through these methods.

use crate::domain::progression::{XP_CAPTURE, XP_KILL, XP_MVP, XP_PARTICIPATION, XP_RETURN, XP_WIN};
use crate::domain::{
    mvp, Arena, FlagPhase, FlagState, MatchCounters, PerTeam, PlayerId, Position, StatDelta, Team,
};
use crate::use_cases::respawn::{RespawnQueue, RespawnTick, SpawnPicker};
use crate::use_cases::types::{
    EngineError, GameSettings, MatchPhase, MatchSnapshot, OutcomeEvent,
};
use std::collections::HashMap;

/// How close a player must be to a flag or return point for pickup,
/// capture and return checks.
pub const INTERACT_RADIUS: f64 = 2.0;

#[derive(Debug)]
struct PlayerEntry {
    name: String,
    team: Team,
    counters: MatchCounters,
    last_position: Position,
    protection_left: u32,
}

pub struct MatchCore {
    arena: Arena,
    settings: GameSettings,
    phase: MatchPhase,
    players: HashMap<PlayerId, PlayerEntry>,
    /// Per-team roster in join order; the MVP tie-break relies on it.
    rosters: PerTeam<Vec<PlayerId>>,
    scores: PerTeam<u32>,
    flags: PerTeam<FlagState>,
    respawns: RespawnQueue,
    picker: SpawnPicker,
    countdown_left: u32,
    clock_left: u32,
    ending_left: u32,
    events: Vec<OutcomeEvent>,
    deltas: Vec<(PlayerId, StatDelta)>,
}

impl MatchCore {
    pub fn new(arena: Arena, settings: GameSettings) -> Result<Self, EngineError> {
        Self::with_picker(arena, settings, SpawnPicker::new())
    }

    pub fn with_picker(
        arena: Arena,
        settings: GameSettings,
        picker: SpawnPicker,
    ) -> Result<Self, EngineError> {
        let problems = arena.validation_errors();
        if !problems.is_empty() {
            return Err(EngineError::ArenaInvalid { problems });
        }

        let invalid = |what: &str| EngineError::ArenaInvalid {
            problems: vec![what.to_string()],
        };
        let red_anchor = arena
            .flag_anchor(Team::Red)
            .ok_or_else(|| invalid("red flag position not set"))?;
        let blue_anchor = arena
            .flag_anchor(Team::Blue)
            .ok_or_else(|| invalid("blue flag position not set"))?;

        Ok(Self {
            flags: PerTeam::new(FlagState::new(red_anchor), FlagState::new(blue_anchor)),
            phase: MatchPhase::Waiting,
            players: HashMap::new(),
            rosters: PerTeam::default(),
            scores: PerTeam::default(),
            respawns: RespawnQueue::new(),
            picker,
            countdown_left: 0,
            clock_left: 0,
            ending_left: 0,
            events: Vec::new(),
            deltas: Vec::new(),
            arena,
            settings,
        })
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn arena_name(&self) -> &str {
        &self.arena.name
    }

    pub fn roster_size(&self) -> usize {
        self.players.len()
    }

    pub fn scores(&self) -> &PerTeam<u32> {
        &self.scores
    }

    pub fn flag_phase(&self, team: Team) -> FlagPhase {
        self.flags.get(team).phase()
    }

    pub fn is_protected(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|entry| entry.protection_left > 0)
    }

    /// Events produced since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<OutcomeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Career-stat changes produced since the last drain.
    pub fn drain_stat_deltas(&mut self) -> Vec<(PlayerId, StatDelta)> {
        std::mem::take(&mut self.deltas)
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            arena: self.arena.name.clone(),
            phase: self.phase,
            scores: self.scores.clone(),
            rosters: self.rosters.clone(),
            flags: PerTeam::new(self.flags.red.phase(), self.flags.blue.phase()),
            clock_left: self.clock_left,
        }
    }

    // ---- roster ----

    /// Add a player to the waiting roster, balancing teams as we go.
    pub fn add_player(&mut self, player: PlayerId, name: String) -> Result<Team, EngineError> {
        match self.phase {
            MatchPhase::Waiting => {}
            _ => return Err(EngineError::MatchInProgress),
        }
        if self.players.contains_key(&player) {
            return Err(EngineError::AlreadyInMatch);
        }
        if self.players.len() >= self.arena.max_players {
            return Err(EngineError::ArenaFull);
        }

        let team = self.balanced_team();
        let lobby = self
            .arena
            .waiting_lobby
            .ok_or_else(|| EngineError::ArenaInvalid {
                problems: vec!["waiting lobby not set".to_string()],
            })?;

        self.players.insert(
            player,
            PlayerEntry {
                name: name.clone(),
                team,
                counters: MatchCounters::default(),
                last_position: lobby,
                protection_left: 0,
            },
        );
        self.rosters.get_mut(team).push(player);
        self.events.push(OutcomeEvent::PlayerJoined {
            player,
            name,
            team,
            lobby,
        });

        if self.players.len() >= self.settings.min_players_to_start {
            self.begin_countdown();
        }

        Ok(team)
    }

    /// Remove a player, dropping any carried flag at their last position.
    /// While active, dipping below the minimum ends the match with no
    /// winner.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<Team, EngineError> {
        let entry = self
            .players
            .remove(&player)
            .ok_or(EngineError::NotInMatch)?;
        let team = entry.team;

        self.rosters.get_mut(team).retain(|id| *id != player);
        self.respawns.remove(player);
        self.drop_carried_flags(player, entry.last_position);

        self.events.push(OutcomeEvent::PlayerLeft { player, team });

        if self.phase == MatchPhase::Active
            && self.players.len() < self.settings.min_players_to_start
        {
            self.end(None);
        }

        Ok(team)
    }

    fn balanced_team(&self) -> Team {
        if self.rosters.red.len() <= self.rosters.blue.len() {
            Team::Red
        } else {
            Team::Blue
        }
    }

    // ---- lifecycle ----

    /// Begin the start countdown. Re-entry while already starting is a
    /// no-op, so the trigger can fire on every join.
    fn begin_countdown(&mut self) {
        if self.phase != MatchPhase::Waiting {
            return;
        }
        self.phase = MatchPhase::Starting;
        self.countdown_left = self.settings.start_countdown;
        self.events.push(OutcomeEvent::StartCountdown {
            seconds_left: self.countdown_left,
        });
    }

    /// Admin-triggered early start.
    pub fn force_start(&mut self) -> Result<(), EngineError> {
        if self.phase != MatchPhase::Waiting {
            return Err(EngineError::InvalidTransition);
        }
        self.begin_countdown();
        Ok(())
    }

    fn begin_active(&mut self) {
        self.phase = MatchPhase::Active;
        self.clock_left = self.settings.game_duration;

        for (_, flag) in self.flags.iter_mut() {
            flag.return_home();
        }

        // Round-robin over each team's spawn list; wraps when the team
        // outnumbers its spawns.
        for team in Team::BOTH {
            let roster = self.rosters.get(team).clone();
            let spawns = self.arena.spawns(team).to_vec();
            for (i, player) in roster.iter().enumerate() {
                let position = spawns[i % spawns.len()];
                if let Some(entry) = self.players.get_mut(player) {
                    entry.last_position = position;
                    entry.protection_left = self.settings.spawn_protection_time;
                }
                self.events.push(OutcomeEvent::SpawnAssigned {
                    player: *player,
                    team,
                    position,
                });
            }
        }

        self.events.push(OutcomeEvent::MatchStarted);
    }

    fn winner_by_score(&self) -> Option<Team> {
        let red = *self.scores.get(Team::Red);
        let blue = *self.scores.get(Team::Blue);
        if red > blue {
            Some(Team::Red)
        } else if blue > red {
            Some(Team::Blue)
        } else {
            None
        }
    }

    /// Finish the match. Safe to call from any phase, any number of
    /// times; only the first call in a live phase takes effect.
    pub fn end(&mut self, winner: Option<Team>) {
        match self.phase {
            MatchPhase::Ending | MatchPhase::Resetting | MatchPhase::Retired => return,
            _ => {}
        }

        self.phase = MatchPhase::Ending;
        self.ending_left = self.settings.ending_hold;
        self.events.push(OutcomeEvent::MatchEnded {
            winner,
            scores: self.scores.clone(),
        });

        if let Some(team) = winner {
            let roster: Vec<(PlayerId, MatchCounters)> = self
                .rosters
                .get(team)
                .iter()
                .filter_map(|id| self.players.get(id).map(|e| (*id, e.counters)))
                .collect();
            if let Some(mvp) = mvp::select_mvp(&roster) {
                let counters = self
                    .players
                    .get(&mvp)
                    .map(|e| e.counters)
                    .unwrap_or_default();
                self.events.push(OutcomeEvent::Mvp {
                    player: mvp,
                    counters,
                });
                self.award(mvp, XP_MVP, StatDelta::default());
            }
        }

        // Participation, win credit and the played/won counters for the
        // whole roster, in join order.
        for team in Team::BOTH {
            for player in self.rosters.get(team).clone() {
                self.award(
                    player,
                    XP_PARTICIPATION,
                    StatDelta {
                        games_played: 1,
                        ..StatDelta::default()
                    },
                );
                if winner == Some(team) {
                    self.award(
                        player,
                        XP_WIN,
                        StatDelta {
                            games_won: 1,
                            ..StatDelta::default()
                        },
                    );
                }
            }
        }
    }

    /// Tear-down after the ending hold: every player leaves through the
    /// normal removal path, then the match reports itself retired.
    fn cleanup(&mut self) {
        self.phase = MatchPhase::Resetting;

        for team in Team::BOTH {
            for player in self.rosters.get(team).clone() {
                self.players.remove(&player);
                self.events.push(OutcomeEvent::PlayerLeft { player, team });
            }
            self.rosters.get_mut(team).clear();
        }
        self.respawns.clear();
        for (_, flag) in self.flags.iter_mut() {
            flag.return_home();
        }
        if self.settings.auto_cleanup_after_game {
            self.events.push(OutcomeEvent::ArenaResetRequested);
        }

        self.phase = MatchPhase::Retired;
    }

    // ---- flags ----

    /// Pick up the opposing flag when standing next to it. Fails while
    /// the flag is carried by anyone, including the caller.
    pub fn attempt_flag_pickup(&mut self, player: PlayerId, position: Position) -> bool {
        if self.phase != MatchPhase::Active || self.respawns.contains(player) {
            return false;
        }
        let Some(entry) = self.players.get_mut(&player) else {
            return false;
        };
        let flag_team = entry.team.opposite();
        entry.last_position = position;

        let flag = self.flags.get_mut(flag_team);
        let Some(ground) = flag.ground_position() else {
            return false;
        };
        if position.distance(&ground) > INTERACT_RADIUS {
            return false;
        }
        if !flag.pick_up(player) {
            return false;
        }

        self.events.push(OutcomeEvent::FlagTaken { player, flag_team });
        true
    }

    /// Score by bringing the carried flag to the carrier's own return
    /// point. Returns the flag home and checks the win threshold.
    pub fn attempt_flag_capture(&mut self, player: PlayerId, position: Position) -> bool {
        if self.phase != MatchPhase::Active {
            return false;
        }
        let Some(entry) = self.players.get_mut(&player) else {
            return false;
        };
        let team = entry.team;
        let flag_team = team.opposite();
        entry.last_position = position;

        if self.flags.get(flag_team).carrier() != Some(player) {
            return false;
        }
        let Some(return_point) = self.arena.flag_return(team) else {
            return false;
        };
        if position.distance(&return_point) > INTERACT_RADIUS {
            return false;
        }

        self.flags.get_mut(flag_team).return_home();
        *self.scores.get_mut(team) += 1;
        let score = *self.scores.get(team);

        if let Some(entry) = self.players.get_mut(&player) {
            entry.counters.captures += 1;
        }
        self.award(
            player,
            XP_CAPTURE,
            StatDelta {
                captures: 1,
                ..StatDelta::default()
            },
        );
        self.events.push(OutcomeEvent::FlagCaptured {
            player,
            flag_team,
            score,
        });

        if score >= self.settings.captures_to_win {
            self.end(Some(team));
        }
        true
    }

    /// Return the caller's own dropped flag by touching it.
    pub fn attempt_flag_return(&mut self, player: PlayerId, position: Position) -> bool {
        if self.phase != MatchPhase::Active || self.respawns.contains(player) {
            return false;
        }
        let Some(entry) = self.players.get_mut(&player) else {
            return false;
        };
        let team = entry.team;
        entry.last_position = position;

        let flag = self.flags.get_mut(team);
        let FlagPhase::Dropped { position: dropped, .. } = flag.phase() else {
            return false;
        };
        if position.distance(&dropped) > INTERACT_RADIUS {
            return false;
        }

        flag.return_home();
        if let Some(entry) = self.players.get_mut(&player) {
            entry.counters.returns += 1;
        }
        self.award(
            player,
            XP_RETURN,
            StatDelta {
                returns: 1,
                ..StatDelta::default()
            },
        );
        self.events.push(OutcomeEvent::FlagReturned {
            flag_team: team,
            by: Some(player),
        });
        true
    }

    /// Voluntary drop by the carrier; arms the auto-return timer.
    pub fn drop_flag(&mut self, player: PlayerId) {
        let Some(position) = self.players.get(&player).map(|e| e.last_position) else {
            return;
        };
        self.drop_carried_flags(player, position);
    }

    fn drop_carried_flags(&mut self, player: PlayerId, position: Position) {
        let delay = self.settings.flag_return_delay;
        for (flag_team, flag) in self.flags.iter_mut() {
            if flag.drop_at(player, position, delay) {
                self.events.push(OutcomeEvent::FlagDropped {
                    player,
                    flag_team,
                    position,
                });
            }
        }
    }

    // ---- movement and combat ----

    /// Position report from the caller. The flag checks ride on this, so
    /// it stays O(number of flags).
    pub fn position_update(&mut self, player: PlayerId, position: Position) {
        let Some(entry) = self.players.get_mut(&player) else {
            return;
        };
        entry.last_position = position;
        self.try_flag_interactions(player, position);
    }

    /// Deliberate interaction (use/click) at a position; same checks as
    /// movement.
    pub fn interact(&mut self, player: PlayerId, position: Position) {
        self.try_flag_interactions(player, position);
    }

    fn try_flag_interactions(&mut self, player: PlayerId, position: Position) {
        if self.attempt_flag_pickup(player, position) {
            return;
        }
        if self.attempt_flag_capture(player, position) {
            return;
        }
        let _ = self.attempt_flag_return(player, position);
    }

    /// Death report: credits the killer, drops any carried flag where the
    /// victim fell and enters the respawn pipeline.
    pub fn report_death(&mut self, player: PlayerId, killer: Option<PlayerId>) {
        if self.phase != MatchPhase::Active || self.respawns.contains(player) {
            return;
        }
        let Some(entry) = self.players.get_mut(&player) else {
            return;
        };
        let team = entry.team;
        let died_at = entry.last_position;
        entry.counters.deaths += 1;
        entry.protection_left = 0;

        self.award(
            player,
            0,
            StatDelta {
                deaths: 1,
                ..StatDelta::default()
            },
        );

        let credited = killer.filter(|k| {
            *k != player
                && self
                    .players
                    .get(k)
                    .is_some_and(|e| e.team == team.opposite())
        });
        if let Some(k) = credited {
            if let Some(killer_entry) = self.players.get_mut(&k) {
                killer_entry.counters.kills += 1;
            }
            self.award(
                k,
                XP_KILL,
                StatDelta {
                    kills: 1,
                    ..StatDelta::default()
                },
            );
        }

        self.events.push(OutcomeEvent::PlayerDied {
            player,
            killer: credited,
        });
        self.drop_carried_flags(player, died_at);

        if let Some(point) = self.arena.spectator_point {
            self.events.push(OutcomeEvent::SpectateStarted {
                player,
                position: point,
                seconds: self.settings.spectator_time,
            });
        }
        self.respawns
            .enqueue(player, team, self.settings.spectator_time);
    }

    /// An attack by a protected player strips their protection when the
    /// remove-on-hit rule is on.
    pub fn report_attack(&mut self, attacker: PlayerId) {
        if !self.settings.spawn_protection_remove_on_hit {
            return;
        }
        if let Some(entry) = self.players.get_mut(&attacker) {
            if entry.protection_left > 0 {
                entry.protection_left = 0;
                self.events
                    .push(OutcomeEvent::SpawnProtectionEnded { player: attacker });
            }
        }
    }

    // ---- clock ----

    /// 1 Hz heartbeat: start countdown, match clock, flag return timers,
    /// spawn protection and the respawn pipeline all advance here.
    pub fn tick(&mut self) {
        match self.phase {
            MatchPhase::Waiting | MatchPhase::Resetting | MatchPhase::Retired => {}
            MatchPhase::Starting => {
                self.countdown_left = self.countdown_left.saturating_sub(1);
                if self.countdown_left == 0 {
                    self.begin_active();
                } else {
                    self.events.push(OutcomeEvent::StartCountdown {
                        seconds_left: self.countdown_left,
                    });
                }
            }
            MatchPhase::Active => {
                self.clock_left = self.clock_left.saturating_sub(1);
                if self.clock_left == 0 {
                    let winner = self.winner_by_score();
                    self.end(winner);
                    return;
                }
                self.tick_flags();
                self.tick_protection();
                self.tick_respawns();
            }
            MatchPhase::Ending => {
                // Dropped flags still walk home during the victory screen.
                self.tick_flags();
                self.ending_left = self.ending_left.saturating_sub(1);
                if self.ending_left == 0 {
                    self.cleanup();
                }
            }
        }
    }

    fn tick_flags(&mut self) {
        for (flag_team, flag) in self.flags.iter_mut() {
            if flag.tick() {
                self.events.push(OutcomeEvent::FlagReturned {
                    flag_team,
                    by: None,
                });
            }
        }
    }

    fn tick_protection(&mut self) {
        for (player, entry) in self.players.iter_mut() {
            if entry.protection_left > 0 {
                entry.protection_left -= 1;
                if entry.protection_left == 0 {
                    self.events
                        .push(OutcomeEvent::SpawnProtectionEnded { player: *player });
                }
            }
        }
    }

    fn tick_respawns(&mut self) {
        let spawn_lists = PerTeam::new(
            self.arena.red_spawns.clone(),
            self.arena.blue_spawns.clone(),
        );
        let ticks = self.respawns.tick(
            self.settings.respawn_delay,
            &mut self.picker,
            move |team| spawn_lists.get(team).clone(),
        );

        for tick in ticks {
            match tick {
                RespawnTick::Spectating {
                    player,
                    seconds_left,
                } => self.events.push(OutcomeEvent::SpectateCountdown {
                    player,
                    seconds_left,
                }),
                RespawnTick::CountingDown {
                    player,
                    seconds_left,
                } => self.events.push(OutcomeEvent::RespawnCountdown {
                    player,
                    seconds_left,
                }),
                RespawnTick::Respawn {
                    player, position, ..
                } => {
                    if let Some(entry) = self.players.get_mut(&player) {
                        entry.last_position = position;
                        entry.protection_left = self.settings.spawn_protection_time;
                    }
                    self.events
                        .push(OutcomeEvent::PlayerRespawned { player, position });
                }
            }
        }
    }

    // ---- stats ----

    fn award(&mut self, player: PlayerId, xp: u32, mut delta: StatDelta) {
        delta.experience = xp;
        self.deltas.push((player, delta));
        if xp > 0 {
            self.events
                .push(OutcomeEvent::XpAwarded { player, amount: xp });
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn arena() -> Arena {
        let mut arena = Arena::new("dunes");
        arena.world = Some("arena_world".to_string());
        arena.waiting_lobby = Some(Position::new(0.0, 64.0, 0.0));
        arena.spectator_point = Some(Position::new(0.0, 80.0, 0.0));
        arena.red_flag = Some(Position::new(-50.0, 64.0, 0.0));
        arena.blue_flag = Some(Position::new(50.0, 64.0, 0.0));
        arena.red_flag_return = Some(Position::new(-48.0, 64.0, 0.0));
        arena.blue_flag_return = Some(Position::new(48.0, 64.0, 0.0));
        arena.red_spawns = vec![
            Position::new(-45.0, 64.0, 5.0),
            Position::new(-45.0, 64.0, -5.0),
        ];
        arena.blue_spawns = vec![
            Position::new(45.0, 64.0, 5.0),
            Position::new(45.0, 64.0, -5.0),
        ];
        arena.corner1 = Some(Position::new(-60.0, 0.0, -60.0));
        arena.corner2 = Some(Position::new(60.0, 128.0, 60.0));
        arena.enabled = true;
        arena
    }

    fn settings() -> GameSettings {
        GameSettings {
            min_players_to_start: 4,
            captures_to_win: 3,
            start_countdown: 3,
            game_duration: 120,
            flag_return_delay: 3,
            spectator_time: 2,
            respawn_delay: 2,
            spawn_protection_time: 2,
            ending_hold: 2,
            ..GameSettings::default()
        }
    }

    fn core_with(settings: GameSettings) -> MatchCore {
        MatchCore::with_picker(arena(), settings, SpawnPicker::seeded(11))
            .expect("fixture arena should be valid")
    }

    /// Joins four players and ticks through the countdown into Active.
    /// Returns ids in join order: red, blue, red, blue.
    fn active_match(settings: GameSettings) -> (MatchCore, Vec<PlayerId>) {
        let mut core = core_with(settings);
        let players: Vec<PlayerId> = (0..4).map(|_| Uuid::new_v4()).collect();
        for (i, id) in players.iter().enumerate() {
            core.add_player(*id, format!("player-{i}"))
                .expect("join should succeed");
        }
        assert_eq!(core.phase(), MatchPhase::Starting);
        for _ in 0..3 {
            core.tick();
        }
        assert_eq!(core.phase(), MatchPhase::Active);
        core.drain_events();
        core.drain_stat_deltas();
        (core, players)
    }

    #[test]
    fn roster_never_exceeds_the_arena_cap() {
        let mut core = core_with(GameSettings {
            min_players_to_start: 99,
            ..settings()
        });
        for i in 0..8 {
            core.add_player(Uuid::new_v4(), format!("p{i}"))
                .expect("join under the cap should succeed");
        }
        assert_eq!(
            core.add_player(Uuid::new_v4(), "overflow".to_string()),
            Err(EngineError::ArenaFull)
        );
        assert_eq!(core.roster_size(), 8);
    }

    #[test]
    fn joins_alternate_teams_with_ties_broken_toward_red() {
        let mut core = core_with(GameSettings {
            min_players_to_start: 99,
            ..settings()
        });
        let teams: Vec<Team> = (0..4)
            .map(|i| {
                core.add_player(Uuid::new_v4(), format!("p{i}"))
                    .expect("join should succeed")
            })
            .collect();
        assert_eq!(teams, vec![Team::Red, Team::Blue, Team::Red, Team::Blue]);
    }

    #[test]
    fn fourth_join_starts_the_countdown_and_the_countdown_starts_the_match() {
        let mut core = core_with(settings());
        for i in 0..3 {
            core.add_player(Uuid::new_v4(), format!("p{i}"))
                .expect("join should succeed");
            assert_eq!(core.phase(), MatchPhase::Waiting);
        }
        core.add_player(Uuid::new_v4(), "p3".to_string())
            .expect("join should succeed");
        assert_eq!(core.phase(), MatchPhase::Starting);

        // Joining while starting is refused.
        assert_eq!(
            core.add_player(Uuid::new_v4(), "late".to_string()),
            Err(EngineError::MatchInProgress)
        );

        core.tick();
        core.tick();
        assert_eq!(core.phase(), MatchPhase::Starting);
        core.tick();
        assert_eq!(core.phase(), MatchPhase::Active);

        let events = core.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, OutcomeEvent::MatchStarted)));
        let spawns = events
            .iter()
            .filter(|e| matches!(e, OutcomeEvent::SpawnAssigned { .. }))
            .count();
        assert_eq!(spawns, 4);
    }

    #[test]
    fn spawn_assignment_wraps_when_a_team_outnumbers_its_spawns() {
        let mut core = core_with(GameSettings {
            min_players_to_start: 5,
            ..settings()
        });
        // Five joins balance 3 red / 2 blue against 2 spawns per team.
        for i in 0..5 {
            core.add_player(Uuid::new_v4(), format!("p{i}"))
                .expect("join should succeed");
        }
        for _ in 0..3 {
            core.tick();
        }
        assert_eq!(core.phase(), MatchPhase::Active);

        let red_spawns = arena().red_spawns;
        let assigned: Vec<Position> = core
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                OutcomeEvent::SpawnAssigned {
                    team: Team::Red,
                    position,
                    ..
                } => Some(position),
                _ => None,
            })
            .collect();
        assert_eq!(
            assigned,
            vec![red_spawns[0], red_spawns[1], red_spawns[0]]
        );
    }

    #[test]
    fn force_start_is_rejected_once_started() {
        let mut core = core_with(settings());
        core.add_player(Uuid::new_v4(), "solo".to_string())
            .expect("join should succeed");
        core.force_start().expect("force start from waiting");
        assert_eq!(core.phase(), MatchPhase::Starting);
        assert_eq!(core.force_start(), Err(EngineError::InvalidTransition));
    }

    #[test]
    fn blue_capture_scores_once_and_sends_the_flag_home() {
        let (mut core, players) = active_match(settings());
        let blue = players[1];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let blue_return = arena().blue_flag_return.expect("fixture has a return point");

        assert!(core.attempt_flag_pickup(blue, red_flag));
        assert!(matches!(
            core.flag_phase(Team::Red),
            FlagPhase::Carried { carrier } if carrier == blue
        ));

        assert!(core.attempt_flag_capture(blue, blue_return));
        assert_eq!(*core.scores().get(Team::Blue), 1);
        assert_eq!(*core.scores().get(Team::Red), 0);
        assert_eq!(core.flag_phase(Team::Red), FlagPhase::AtBase);

        let events = core.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            OutcomeEvent::FlagCaptured { flag_team: Team::Red, score: 1, .. }
        )));
    }

    #[test]
    fn second_pickup_of_a_carried_flag_fails() {
        let (mut core, players) = active_match(settings());
        let blue_a = players[1];
        let blue_b = players[3];
        let red_flag = arena().red_flag.expect("fixture has a red flag");

        assert!(core.attempt_flag_pickup(blue_a, red_flag));
        assert!(!core.attempt_flag_pickup(blue_b, red_flag));
    }

    #[test]
    fn pickup_outside_the_radius_fails() {
        let (mut core, players) = active_match(settings());
        let blue = players[1];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let far = Position::new(red_flag.x + 3.0, red_flag.y, red_flag.z);
        assert!(!core.attempt_flag_pickup(blue, far));
    }

    #[test]
    fn reaching_the_capture_threshold_ends_the_match_immediately() {
        let (mut core, players) = active_match(GameSettings {
            captures_to_win: 1,
            ..settings()
        });
        let blue = players[1];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let blue_return = arena().blue_flag_return.expect("fixture has a return point");

        core.attempt_flag_pickup(blue, red_flag);
        core.attempt_flag_capture(blue, blue_return);

        assert_eq!(core.phase(), MatchPhase::Ending);
        let events = core.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            OutcomeEvent::MatchEnded { winner: Some(Team::Blue), .. }
        )));
    }

    #[test]
    fn dropping_below_minimum_ends_with_no_winner_exactly_once() {
        let (mut core, players) = active_match(settings());

        core.remove_player(players[0]).expect("player is present");
        assert_eq!(core.phase(), MatchPhase::Ending);

        // Further removals must not produce a second ending.
        core.remove_player(players[1]).expect("player is present");
        let ended = core
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OutcomeEvent::MatchEnded { winner: None, .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn carrier_disconnect_drops_the_flag_and_the_timer_returns_it() {
        // A disconnect from a minimum-size roster also ends the match; the
        // return timer keeps running through the ending hold.
        let (mut core, players) = active_match(GameSettings {
            ending_hold: 10,
            ..settings()
        });
        let blue = players[1];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let carry_spot = Position::new(0.0, 64.0, 12.0);

        core.attempt_flag_pickup(blue, red_flag);
        core.position_update(blue, carry_spot);
        core.remove_player(blue).expect("player is present");

        assert!(matches!(
            core.flag_phase(Team::Red),
            FlagPhase::Dropped { position, .. } if position == carry_spot
        ));

        // flag_return_delay is 3 in the fixture settings.
        core.tick();
        core.tick();
        core.tick();
        assert_eq!(core.flag_phase(Team::Red), FlagPhase::AtBase);
        let events = core.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            OutcomeEvent::FlagReturned { flag_team: Team::Red, by: None }
        )));
    }

    #[test]
    fn own_dropped_flag_can_be_returned_by_touch() {
        let (mut core, players) = active_match(settings());
        let blue = players[1];
        let red = players[0];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let drop_spot = Position::new(10.0, 64.0, 0.0);

        core.attempt_flag_pickup(blue, red_flag);
        core.position_update(blue, drop_spot);
        core.drop_flag(blue);

        assert!(core.attempt_flag_return(red, drop_spot));
        assert_eq!(core.flag_phase(Team::Red), FlagPhase::AtBase);
        let deltas = core.drain_stat_deltas();
        assert!(deltas
            .iter()
            .any(|(id, d)| *id == red && d.returns == 1 && d.experience > 0));
    }

    #[test]
    fn time_expiry_with_equal_scores_is_a_tie() {
        let (mut core, _) = active_match(GameSettings {
            game_duration: 2,
            ..settings()
        });
        core.tick();
        assert_eq!(core.phase(), MatchPhase::Active);
        core.tick();
        assert_eq!(core.phase(), MatchPhase::Ending);
        let events = core.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, OutcomeEvent::MatchEnded { winner: None, .. })));
    }

    #[test]
    fn death_walks_the_respawn_pipeline_and_regrants_protection() {
        let (mut core, players) = active_match(settings());
        let victim = players[0];
        let killer = players[1];

        core.report_death(victim, Some(killer));
        let deltas = core.drain_stat_deltas();
        assert!(deltas.iter().any(|(id, d)| *id == victim && d.deaths == 1));
        assert!(deltas.iter().any(|(id, d)| *id == killer && d.kills == 1));

        // Dead players cannot touch flags.
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        assert!(!core.attempt_flag_pickup(victim, red_flag));

        // spectator_time 2 + respawn_delay 2.
        for _ in 0..4 {
            core.tick();
        }
        let events = core.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, OutcomeEvent::PlayerRespawned { player, .. } if *player == victim)));
        assert!(core.is_protected(victim));
    }

    #[test]
    fn same_team_kills_earn_no_credit() {
        let (mut core, players) = active_match(settings());
        let victim = players[0];
        let teammate = players[2];

        core.report_death(victim, Some(teammate));
        let deltas = core.drain_stat_deltas();
        assert!(!deltas.iter().any(|(id, d)| *id == teammate && d.kills > 0));
    }

    #[test]
    fn ending_hold_expires_into_retirement_with_an_empty_roster() {
        let (mut core, _) = active_match(settings());
        core.end(Some(Team::Red));
        assert_eq!(core.phase(), MatchPhase::Ending);

        core.tick();
        core.tick();
        assert_eq!(core.phase(), MatchPhase::Retired);
        assert_eq!(core.roster_size(), 0);
    }

    #[test]
    fn end_is_idempotent_across_phases() {
        let (mut core, _) = active_match(settings());
        core.end(None);
        core.end(Some(Team::Red));
        core.end(None);
        let ended = core
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, OutcomeEvent::MatchEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn winner_roster_gets_win_credit_and_an_mvp_when_someone_scored() {
        let (mut core, players) = active_match(GameSettings {
            captures_to_win: 1,
            ..settings()
        });
        let blue = players[1];
        let red_flag = arena().red_flag.expect("fixture has a red flag");
        let blue_return = arena().blue_flag_return.expect("fixture has a return point");

        core.attempt_flag_pickup(blue, red_flag);
        core.attempt_flag_capture(blue, blue_return);

        let events = core.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, OutcomeEvent::Mvp { player, .. } if *player == blue)));

        let deltas = core.drain_stat_deltas();
        let blue_won = deltas
            .iter()
            .any(|(id, d)| *id == blue && d.games_won == 1);
        let red_won = deltas
            .iter()
            .any(|(id, d)| *id == players[0] && d.games_won == 1);
        let all_played = players.iter().all(|p| {
            deltas
                .iter()
                .any(|(id, d)| id == p && d.games_played == 1)
        });
        assert!(blue_won);
        assert!(!red_won);
        assert!(all_played);
    }

    #[test]
    fn spawn_protection_expires_and_attacking_strips_it() {
        let (mut core, players) = active_match(settings());
        assert!(core.is_protected(players[0]));

        core.report_attack(players[0]);
        assert!(!core.is_protected(players[0]));

        // The others lose protection to the clock (2 s in fixture).
        core.tick();
        core.tick();
        assert!(!core.is_protected(players[1]));
    }
}
