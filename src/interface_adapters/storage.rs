// Flat-file JSON implementation of the DataStore port: one file per
// arena, one per player.

use crate::domain::ports::DataStore;
use crate::domain::{Arena, PlayerId, PlayerStats};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct JsonFileStore {
    arenas_dir: PathBuf,
    players_dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create, if needed) the store layout under `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, String> {
        let root = root.as_ref();
        let arenas_dir = root.join("arenas");
        let players_dir = root.join("playerdata");
        fs::create_dir_all(&arenas_dir)
            .await
            .map_err(|e| e.to_string())?;
        fs::create_dir_all(&players_dir)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Self {
            arenas_dir,
            players_dir,
        })
    }

    fn arena_path(&self, name: &str) -> PathBuf {
        self.arenas_dir.join(format!("{}.json", name.to_lowercase()))
    }

    fn player_path(&self, player: PlayerId) -> PathBuf {
        self.players_dir.join(format!("{player}.json"))
    }
}

#[async_trait]
impl DataStore for JsonFileStore {
    async fn load_arena(&self, name: &str) -> Result<Option<Arena>, String> {
        let path = self.arena_path(name);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| e.to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn save_arena(&self, arena: &Arena) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(arena).map_err(|e| e.to_string())?;
        fs::write(self.arena_path(&arena.name), bytes)
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete_arena(&self, name: &str) -> Result<(), String> {
        match fs::remove_file(self.arena_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn list_arenas(&self) -> Result<Vec<Arena>, String> {
        let mut arenas = Vec::new();
        let mut entries = fs::read_dir(&self.arenas_dir)
            .await
            .map_err(|e| e.to_string())?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await.map_err(|e| e.to_string())?;
            match serde_json::from_slice::<Arena>(&bytes) {
                Ok(arena) => arenas.push(arena),
                Err(error) => {
                    // One broken file must not take the whole catalog down.
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable arena file");
                }
            }
        }
        Ok(arenas)
    }

    async fn load_player_stats(&self, player: PlayerId) -> Result<PlayerStats, String> {
        match fs::read(self.player_path(player)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| e.to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PlayerStats::default()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn save_player_stats(
        &self,
        player: PlayerId,
        stats: &PlayerStats,
    ) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(stats).map_err(|e| e.to_string())?;
        fs::write(self.player_path(player), bytes)
            .await
            .map_err(|e| e.to_string())
    }
}
