// Team identity and per-team storage.

use serde::{Deserialize, Serialize};

/// One of the two opposing sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opposite(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Team::Red => "Red Team",
            Team::Blue => "Blue Team",
        }
    }

    pub const BOTH: [Team; 2] = [Team::Red, Team::Blue];
}

/// A pair of values, one per team, addressed by `Team`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerTeam<T> {
    pub red: T,
    pub blue: T,
}

impl<T> PerTeam<T> {
    pub fn new(red: T, blue: T) -> Self {
        Self { red, blue }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> {
        [(Team::Red, &self.red), (Team::Blue, &self.blue)].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Team, &mut T)> {
        [(Team::Red, &mut self.red), (Team::Blue, &mut self.blue)].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for team in Team::BOTH {
            assert_eq!(team.opposite().opposite(), team);
        }
        assert_eq!(Team::Red.opposite(), Team::Blue);
    }

    #[test]
    fn per_team_addresses_the_right_slot() {
        let mut pair = PerTeam::new(1, 2);
        assert_eq!(*pair.get(Team::Red), 1);
        assert_eq!(*pair.get(Team::Blue), 2);
        *pair.get_mut(Team::Blue) = 7;
        assert_eq!(pair.blue, 7);
    }
}
