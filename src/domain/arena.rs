// Static arena definition: geometry, capacity and the enabled switch.

use crate::domain::position::Position;
use crate::domain::team::Team;
use serde::{Deserialize, Serialize};

/// Everything a match needs to know about one map. Loaded from storage at
/// startup and only mutated through the setup flow or admin enable/disable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    pub display_name: String,
    pub world: Option<String>,
    pub region: Option<String>,

    pub waiting_lobby: Option<Position>,
    pub spectator_point: Option<Position>,
    pub red_flag: Option<Position>,
    pub blue_flag: Option<Position>,
    pub red_flag_return: Option<Position>,
    pub blue_flag_return: Option<Position>,
    #[serde(default)]
    pub red_spawns: Vec<Position>,
    #[serde(default)]
    pub blue_spawns: Vec<Position>,
    pub corner1: Option<Position>,
    pub corner2: Option<Position>,

    pub max_players: usize,
    pub enabled: bool,
}

impl Arena {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            world: None,
            region: None,
            waiting_lobby: None,
            spectator_point: None,
            red_flag: None,
            blue_flag: None,
            red_flag_return: None,
            blue_flag_return: None,
            red_spawns: Vec::new(),
            blue_spawns: Vec::new(),
            corner1: None,
            corner2: None,
            max_players: 8,
            enabled: false,
        }
    }

    pub fn flag_anchor(&self, team: Team) -> Option<Position> {
        match team {
            Team::Red => self.red_flag,
            Team::Blue => self.blue_flag,
        }
    }

    pub fn flag_return(&self, team: Team) -> Option<Position> {
        match team {
            Team::Red => self.red_flag_return,
            Team::Blue => self.blue_flag_return,
        }
    }

    pub fn spawns(&self, team: Team) -> &[Position] {
        match team {
            Team::Red => &self.red_spawns,
            Team::Blue => &self.blue_spawns,
        }
    }

    pub fn spawns_mut(&mut self, team: Team) -> &mut Vec<Position> {
        match team {
            Team::Red => &mut self.red_spawns,
            Team::Blue => &mut self.blue_spawns,
        }
    }

    /// Every problem keeping this arena from hosting a match. Empty means
    /// the arena is playable.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.world.is_none() {
            errors.push("world not set".to_string());
        }
        if self.waiting_lobby.is_none() {
            errors.push("waiting lobby not set".to_string());
        }
        if self.spectator_point.is_none() {
            errors.push("spectator point not set".to_string());
        }
        for team in Team::BOTH {
            let spawns = self.spawns(team);
            if spawns.len() < 2 {
                errors.push(format!(
                    "{} needs at least 2 spawns (currently: {})",
                    team.display_name(),
                    spawns.len()
                ));
            }
            if self.flag_anchor(team).is_none() {
                errors.push(format!("{} flag position not set", team.display_name()));
            }
            if self.flag_return(team).is_none() {
                errors.push(format!("{} flag return position not set", team.display_name()));
            }
        }
        if self.corner1.is_none() || self.corner2.is_none() {
            errors.push("arena bounds not set (both corners required)".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}
