// Ports the engine is handed implementations (or test doubles) for.

use crate::domain::arena::Arena;
use crate::domain::position::Position;
use crate::domain::stats::PlayerStats;
use crate::domain::PlayerId;
use async_trait::async_trait;

/// Persistence of arena definitions and cumulative player counters. The
/// engine never waits on these calls before advancing match state; a
/// failed write is logged and the in-memory state stands.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn load_arena(&self, name: &str) -> Result<Option<Arena>, String>;
    async fn save_arena(&self, arena: &Arena) -> Result<(), String>;
    async fn delete_arena(&self, name: &str) -> Result<(), String>;
    async fn list_arenas(&self) -> Result<Vec<Arena>, String>;
    /// Missing players resolve to fresh zeroed stats.
    async fn load_player_stats(&self, player: PlayerId) -> Result<PlayerStats, String>;
    async fn save_player_stats(&self, player: PlayerId, stats: &PlayerStats)
        -> Result<(), String>;
}

/// World-protection hooks, used only on the arena setup/enable path.
pub trait RegionGuard: Send + Sync {
    fn is_protected(&self, position: &Position) -> bool;
    fn create_region(
        &self,
        arena_name: &str,
        corner1: Position,
        corner2: Position,
    ) -> Result<(), String>;
}
