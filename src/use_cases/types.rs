// Use-case level inputs/outputs shared by the match actor and the registry.

use crate::domain::{FlagPhase, MatchCounters, PerTeam, PlayerId, Position, Team};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Gameplay settings applied to every match. Defaults match the shipped
/// configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Default roster cap for newly created arenas.
    pub max_players_per_arena: usize,
    pub min_players_to_start: usize,
    /// Match clock, in seconds.
    pub game_duration: u32,
    /// Seconds from countdown start to the opening whistle.
    pub start_countdown: u32,
    pub captures_to_win: u32,
    /// Seconds a dropped flag waits before returning home on its own.
    pub flag_return_delay: u32,
    pub spectator_time: u32,
    pub respawn_delay: u32,
    pub spawn_protection_time: u32,
    pub spawn_protection_remove_on_hit: bool,
    /// Seconds the victory screen holds before the arena resets.
    pub ending_hold: u32,
    /// Ask the world owner to restore arena geometry after each match.
    pub auto_cleanup_after_game: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players_per_arena: 8,
            min_players_to_start: 4,
            game_duration: 900,
            start_countdown: 10,
            captures_to_win: 3,
            flag_return_delay: 30,
            spectator_time: 5,
            respawn_delay: 5,
            spawn_protection_time: 5,
            spawn_protection_remove_on_hit: true,
            ending_hold: 10,
            auto_cleanup_after_game: true,
        }
    }
}

/// High-level lifecycle phase of one match, published on a watch channel.
/// Phases only ever move forward; `Retired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Waiting,
    Starting,
    Active,
    Ending,
    Resetting,
    Retired,
}

/// Recoverable reasons an engine operation can refuse a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    ArenaNotFound { arena: String },
    ArenaInvalid { problems: Vec<String> },
    ArenaFull,
    AlreadyInMatch,
    NotInMatch,
    MatchInProgress,
    InvalidTransition,
}

/// A structured outcome the presentation layer turns into on-screen
/// feedback. The engine never formats text.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeEvent {
    PlayerJoined {
        player: PlayerId,
        name: String,
        team: Team,
        lobby: Position,
    },
    PlayerLeft {
        player: PlayerId,
        team: Team,
    },
    StartCountdown {
        seconds_left: u32,
    },
    MatchStarted,
    SpawnAssigned {
        player: PlayerId,
        team: Team,
        position: Position,
    },
    FlagTaken {
        player: PlayerId,
        flag_team: Team,
    },
    FlagDropped {
        player: PlayerId,
        flag_team: Team,
        position: Position,
    },
    FlagReturned {
        flag_team: Team,
        by: Option<PlayerId>,
    },
    FlagCaptured {
        player: PlayerId,
        flag_team: Team,
        score: u32,
    },
    PlayerDied {
        player: PlayerId,
        killer: Option<PlayerId>,
    },
    SpectateStarted {
        player: PlayerId,
        position: Position,
        seconds: u32,
    },
    SpectateCountdown {
        player: PlayerId,
        seconds_left: u32,
    },
    RespawnCountdown {
        player: PlayerId,
        seconds_left: u32,
    },
    PlayerRespawned {
        player: PlayerId,
        position: Position,
    },
    SpawnProtectionEnded {
        player: PlayerId,
    },
    MatchEnded {
        winner: Option<Team>,
        scores: PerTeam<u32>,
    },
    /// Emitted while resetting when auto-cleanup is configured; the world
    /// owner restores the arena geometry.
    ArenaResetRequested,
    Mvp {
        player: PlayerId,
        counters: MatchCounters,
    },
    XpAwarded {
        player: PlayerId,
        amount: u32,
    },
    LevelUp {
        player: PlayerId,
        level: u32,
        coins: u32,
    },
}

/// Point-in-time view of a match for status queries and tests.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub arena: String,
    pub phase: MatchPhase,
    pub scores: PerTeam<u32>,
    pub rosters: PerTeam<Vec<PlayerId>>,
    pub flags: PerTeam<FlagPhase>,
    pub clock_left: u32,
}

/// Commands funneled into a match actor. Every mutation of match state
/// arrives through this channel.
#[derive(Debug)]
pub enum MatchCommand {
    Join {
        player: PlayerId,
        name: String,
        reply: oneshot::Sender<Result<Team, EngineError>>,
    },
    Leave {
        player: PlayerId,
    },
    ForceStart,
    ForceEnd,
    PositionUpdate {
        player: PlayerId,
        position: Position,
    },
    Interact {
        player: PlayerId,
        position: Position,
    },
    DropFlag {
        player: PlayerId,
    },
    ReportDeath {
        player: PlayerId,
        killer: Option<PlayerId>,
    },
    ReportAttack {
        attacker: PlayerId,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
}
