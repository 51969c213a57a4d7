use crate::use_cases::{GameSettings, RegistrySettings};
use serde::Deserialize;
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("CTF_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3004)
}

pub fn data_dir() -> String {
    env::var("CTF_DATA_DIR").unwrap_or_else(|_| "data".to_string())
}

pub fn settings_path() -> String {
    env::var("CTF_CONFIG").unwrap_or_else(|_| "ctf.toml".to_string())
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 128;

// Matches, countdowns and respawns advance once per second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    settings: GameSettings,
}

/// Gameplay settings from the TOML config file; every missing key falls
/// back to its default, and a missing file means all defaults.
pub fn load_game_settings() -> GameSettings {
    let path = settings_path();
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return GameSettings::default(),
    };
    match toml::from_str::<SettingsFile>(&text) {
        Ok(file) => file.settings,
        Err(error) => {
            tracing::warn!(%path, %error, "unreadable settings file, using defaults");
            GameSettings::default()
        }
    }
}

pub fn registry_settings() -> RegistrySettings {
    RegistrySettings {
        command_channel_capacity: COMMAND_CHANNEL_CAPACITY,
        event_broadcast_capacity: EVENT_BROADCAST_CAPACITY,
        tick_interval: TICK_INTERVAL,
        game: load_game_settings(),
    }
}
