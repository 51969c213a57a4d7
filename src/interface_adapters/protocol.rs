// Wire DTOs for the command surface. No game logic lives here.

use crate::domain::{PlayerId, PlayerStats, Position, Team};
use crate::use_cases::{MatchPhase, MatchSnapshot};
use serde::{Deserialize, Serialize};

// Request payload for joining a specific arena's queue.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub player_id: PlayerId,
    pub display_name: String,
    pub arena: String,
}

// Request payload for joining any available arena.
#[derive(Debug, Deserialize)]
pub struct JoinRandomRequest {
    pub player_id: PlayerId,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub arena: String,
    pub team: Team,
}

// Body for operations addressed at a single player.
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub player_id: PlayerId,
}

// Position report riding the movement/interaction hot path.
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub player_id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Deserialize)]
pub struct DeathRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub killer_id: Option<PlayerId>,
}

// One row of the arena listing.
#[derive(Debug, Serialize)]
pub struct ArenaSummary {
    pub name: String,
    pub display_name: String,
    pub enabled: bool,
    pub valid: bool,
    pub max_players: usize,
    pub phase: Option<MatchPhase>,
    pub players: Option<usize>,
    pub red_score: Option<u32>,
    pub blue_score: Option<u32>,
    pub clock_left: Option<u32>,
}

impl ArenaSummary {
    pub fn from_parts(
        name: String,
        display_name: String,
        enabled: bool,
        valid: bool,
        max_players: usize,
        snapshot: Option<&MatchSnapshot>,
    ) -> Self {
        Self {
            name,
            display_name,
            enabled,
            valid,
            max_players,
            phase: snapshot.map(|s| s.phase),
            players: snapshot.map(|s| s.rosters.red.len() + s.rosters.blue.len()),
            red_score: snapshot.map(|s| s.scores.red),
            blue_score: snapshot.map(|s| s.scores.blue),
            clock_left: snapshot.map(|s| s.clock_left),
        }
    }
}

// Career stats plus the derived level for profile screens.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: PlayerStats,
    pub level: u32,
}

#[derive(Debug, Deserialize)]
pub struct SetupStartRequest {
    pub admin_id: PlayerId,
    pub arena: String,
    pub world: String,
}

#[derive(Debug, Deserialize)]
pub struct SetupPositionRequest {
    pub admin_id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Deserialize)]
pub struct SetupAdvanceRequest {
    pub admin_id: PlayerId,
}

#[derive(Debug, Serialize)]
pub struct SetupStepResponse {
    // None once the arena has been completed and enabled.
    pub next_step: Option<String>,
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
