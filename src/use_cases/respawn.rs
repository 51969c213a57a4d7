// Death -> spectate -> respawn pipeline for one match.

use crate::domain::{PlayerId, Position, Team};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which half of the dead-time a player is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RespawnPhase {
    Spectating { left: u32 },
    Respawning { left: u32 },
}

#[derive(Debug, Clone)]
struct RespawnEntry {
    player: PlayerId,
    team: Team,
    phase: RespawnPhase,
}

/// What the queue reports back on each tick so the match can react.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RespawnTick {
    Spectating { player: PlayerId, seconds_left: u32 },
    CountingDown { player: PlayerId, seconds_left: u32 },
    /// Countdown finished; place the player at `position`.
    Respawn {
        player: PlayerId,
        team: Team,
        position: Position,
    },
}

/// Deterministic spawn selector. Seeded from the clock in production and
/// from a fixed value in tests.
#[derive(Debug, Clone)]
pub struct SpawnPicker {
    state: u64,
}

impl SpawnPicker {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self::seeded(nanos | 1)
    }

    pub fn seeded(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    /// Index into a spawn list of length `len` (xorshift64*).
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_f491_4f6c_dd1d) % len as u64) as usize
    }
}

impl Default for SpawnPicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Players currently dead, each walking through spectate-then-respawn
/// countdowns. Ticked once per second by the owning match. Entries keep
/// insertion order; the index keeps membership checks O(1) since the
/// movement hot path asks on every position report.
#[derive(Debug, Default)]
pub struct RespawnQueue {
    entries: Vec<RespawnEntry>,
    index: std::collections::HashSet<PlayerId>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.index.contains(&player)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enter the pipeline at the spectating phase. Re-enqueueing a player
    /// already in the queue restarts their cycle.
    pub fn enqueue(&mut self, player: PlayerId, team: Team, spectator_time: u32) {
        self.remove(player);
        self.index.insert(player);
        self.entries.push(RespawnEntry {
            player,
            team,
            phase: RespawnPhase::Spectating {
                left: spectator_time,
            },
        });
    }

    /// Drop a player without completing the cycle (disconnect, match end).
    pub fn remove(&mut self, player: PlayerId) {
        self.index.remove(&player);
        self.entries.retain(|e| e.player != player);
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    /// One-second step for every queued player. `spawns_for` supplies the
    /// team's spawn list; finished players are removed from the queue.
    pub fn tick(
        &mut self,
        respawn_delay: u32,
        picker: &mut SpawnPicker,
        spawns_for: impl Fn(Team) -> Vec<Position>,
    ) -> Vec<RespawnTick> {
        let mut out = Vec::new();
        let mut done = Vec::new();

        for entry in &mut self.entries {
            match entry.phase {
                RespawnPhase::Spectating { left } => {
                    let left = left.saturating_sub(1);
                    if left == 0 {
                        entry.phase = RespawnPhase::Respawning {
                            left: respawn_delay,
                        };
                        out.push(RespawnTick::CountingDown {
                            player: entry.player,
                            seconds_left: respawn_delay,
                        });
                    } else {
                        entry.phase = RespawnPhase::Spectating { left };
                        out.push(RespawnTick::Spectating {
                            player: entry.player,
                            seconds_left: left,
                        });
                    }
                }
                RespawnPhase::Respawning { left } => {
                    let left = left.saturating_sub(1);
                    if left == 0 {
                        let spawns = spawns_for(entry.team);
                        if spawns.is_empty() {
                            // Nowhere to put the player; keep them queued.
                            continue;
                        }
                        let position = spawns[picker.pick(spawns.len())];
                        out.push(RespawnTick::Respawn {
                            player: entry.player,
                            team: entry.team,
                            position,
                        });
                        done.push(entry.player);
                    } else {
                        entry.phase = RespawnPhase::Respawning { left };
                        out.push(RespawnTick::CountingDown {
                            player: entry.player,
                            seconds_left: left,
                        });
                    }
                }
            }
        }

        for player in &done {
            self.index.remove(player);
        }
        self.entries.retain(|e| !done.contains(&e.player));
        out
    }
}
