// Shared doubles and fixtures for the engine integration tests.

use async_trait::async_trait;
use ctf_server::domain::ports::{DataStore, RegionGuard};
use ctf_server::domain::{Arena, PlayerId, PlayerStats, Position};
use ctf_server::use_cases::{GameSettings, MatchRegistry, RegistrySettings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// In-memory store so tests never touch the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    arenas: Mutex<HashMap<String, Arena>>,
    stats: Mutex<HashMap<PlayerId, PlayerStats>>,
}

impl MemoryStore {
    pub async fn stats_for(&self, player: PlayerId) -> PlayerStats {
        self.stats
            .lock()
            .await
            .get(&player)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn load_arena(&self, name: &str) -> Result<Option<Arena>, String> {
        Ok(self.arenas.lock().await.get(&name.to_lowercase()).cloned())
    }

    async fn save_arena(&self, arena: &Arena) -> Result<(), String> {
        self.arenas
            .lock()
            .await
            .insert(arena.name.to_lowercase(), arena.clone());
        Ok(())
    }

    async fn delete_arena(&self, name: &str) -> Result<(), String> {
        self.arenas.lock().await.remove(&name.to_lowercase());
        Ok(())
    }

    async fn list_arenas(&self) -> Result<Vec<Arena>, String> {
        Ok(self.arenas.lock().await.values().cloned().collect())
    }

    async fn load_player_stats(&self, player: PlayerId) -> Result<PlayerStats, String> {
        Ok(self.stats_for(player).await)
    }

    async fn save_player_stats(
        &self,
        player: PlayerId,
        stats: &PlayerStats,
    ) -> Result<(), String> {
        self.stats.lock().await.insert(player, *stats);
        Ok(())
    }
}

pub struct AllowAllGuard;

impl RegionGuard for AllowAllGuard {
    fn is_protected(&self, _position: &Position) -> bool {
        false
    }

    fn create_region(
        &self,
        _arena_name: &str,
        _corner1: Position,
        _corner2: Position,
    ) -> Result<(), String> {
        Ok(())
    }
}

pub fn playable_arena(name: &str) -> Arena {
    let mut arena = Arena::new(name);
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

/// Registry on a fast heartbeat so lifecycle tests finish quickly.
pub async fn registry_with(
    arenas: Vec<Arena>,
    game: GameSettings,
) -> (Arc<MatchRegistry>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    for arena in arenas {
        store.save_arena(&arena).await.expect("seed arena");
    }

    let registry = Arc::new(MatchRegistry::new(
        RegistrySettings {
            tick_interval: Duration::from_millis(10),
            game,
            ..RegistrySettings::default()
        },
        store.clone(),
        Arc::new(AllowAllGuard),
    ));
    registry.load_arenas().await;
    (registry, store)
}
