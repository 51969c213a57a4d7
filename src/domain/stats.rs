// Per-player counters: cumulative career stats and per-match counters.

use serde::{Deserialize, Serialize};

/// Career statistics persisted through the data store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    pub captures: u32,
    pub returns: u32,
    pub games_played: u32,
    pub games_won: u32,
    pub experience: u32,
    pub coins: u32,
}

impl PlayerStats {
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            return self.kills as f64;
        }
        self.kills as f64 / self.deaths as f64
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.games_won as f64 / self.games_played as f64 * 100.0
    }
}

/// Combat and objective counters for one player within one match. These are
/// the MVP inputs and reset with every match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounters {
    pub kills: u32,
    pub deaths: u32,
    pub captures: u32,
    pub returns: u32,
}

/// A batch of stat changes to fold into a player's career record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub kills: u32,
    pub deaths: u32,
    pub captures: u32,
    pub returns: u32,
    pub games_played: u32,
    pub games_won: u32,
    pub experience: u32,
}

impl StatDelta {
    pub fn apply_to(&self, stats: &mut PlayerStats) {
        stats.kills = stats.kills.saturating_add(self.kills);
        stats.deaths = stats.deaths.saturating_add(self.deaths);
        stats.captures = stats.captures.saturating_add(self.captures);
        stats.returns = stats.returns.saturating_add(self.returns);
        stats.games_played = stats.games_played.saturating_add(self.games_played);
        stats.games_won = stats.games_won.saturating_add(self.games_won);
        stats.experience = stats.experience.saturating_add(self.experience);
    }
}
