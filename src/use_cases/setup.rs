// Guided arena setup: an ordered walk through every required position.

use crate::domain::{Arena, Position, Team};

/// The steps of the setup walk, in order. Advancing is an exhaustive
/// match, so adding a step forces every site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    WaitingLobby,
    SpectatorPoint,
    RedFlag,
    BlueFlag,
    RedFlagReturn,
    BlueFlagReturn,
    RedSpawns,
    BlueSpawns,
    Corner1,
    Corner2,
    Confirm,
}

impl SetupStep {
    fn next(self) -> Option<SetupStep> {
        match self {
            SetupStep::WaitingLobby => Some(SetupStep::SpectatorPoint),
            SetupStep::SpectatorPoint => Some(SetupStep::RedFlag),
            SetupStep::RedFlag => Some(SetupStep::BlueFlag),
            SetupStep::BlueFlag => Some(SetupStep::RedFlagReturn),
            SetupStep::RedFlagReturn => Some(SetupStep::BlueFlagReturn),
            SetupStep::BlueFlagReturn => Some(SetupStep::RedSpawns),
            SetupStep::RedSpawns => Some(SetupStep::BlueSpawns),
            SetupStep::BlueSpawns => Some(SetupStep::Corner1),
            SetupStep::Corner1 => Some(SetupStep::Corner2),
            SetupStep::Corner2 => Some(SetupStep::Confirm),
            SetupStep::Confirm => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            SetupStep::WaitingLobby => "set the waiting lobby point",
            SetupStep::SpectatorPoint => "set the spectator point",
            SetupStep::RedFlag => "set the red flag anchor",
            SetupStep::BlueFlag => "set the blue flag anchor",
            SetupStep::RedFlagReturn => "set the red flag return point",
            SetupStep::BlueFlagReturn => "set the blue flag return point",
            SetupStep::RedSpawns => "add red spawns (at least 2)",
            SetupStep::BlueSpawns => "add blue spawns (at least 2)",
            SetupStep::Corner1 => "set the first bounds corner",
            SetupStep::Corner2 => "set the second bounds corner",
            SetupStep::Confirm => "confirm and enable the arena",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    ArenaExists { arena: String },
    NotInSetup,
    StepIncomplete { step: &'static str },
    Invalid { problems: Vec<String> },
    Storage { message: String },
}

/// What `advance` did: moved to the next step, or produced the finished
/// arena for the caller to persist and enable.
#[derive(Debug)]
pub enum SetupProgress {
    Moved(SetupStep),
    Complete(Arena),
}

/// One admin's in-flight arena under construction.
#[derive(Debug)]
pub struct SetupSession {
    arena: Arena,
    step: SetupStep,
}

impl SetupSession {
    pub fn new(name: impl Into<String>, world: impl Into<String>, max_players: usize) -> Self {
        let mut arena = Arena::new(name);
        arena.world = Some(world.into());
        arena.max_players = max_players;
        Self {
            arena,
            step: SetupStep::WaitingLobby,
        }
    }

    pub fn step(&self) -> SetupStep {
        self.step
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Record `position` for the current step. Spawn steps accumulate;
    /// everything else overwrites.
    pub fn record_position(&mut self, position: Position) {
        match self.step {
            SetupStep::WaitingLobby => self.arena.waiting_lobby = Some(position),
            SetupStep::SpectatorPoint => self.arena.spectator_point = Some(position),
            SetupStep::RedFlag => self.arena.red_flag = Some(position),
            SetupStep::BlueFlag => self.arena.blue_flag = Some(position),
            SetupStep::RedFlagReturn => self.arena.red_flag_return = Some(position),
            SetupStep::BlueFlagReturn => self.arena.blue_flag_return = Some(position),
            SetupStep::RedSpawns => self.arena.spawns_mut(Team::Red).push(position),
            SetupStep::BlueSpawns => self.arena.spawns_mut(Team::Blue).push(position),
            SetupStep::Corner1 => self.arena.corner1 = Some(position),
            SetupStep::Corner2 => self.arena.corner2 = Some(position),
            SetupStep::Confirm => {}
        }
    }

    fn step_satisfied(&self) -> bool {
        match self.step {
            SetupStep::WaitingLobby => self.arena.waiting_lobby.is_some(),
            SetupStep::SpectatorPoint => self.arena.spectator_point.is_some(),
            SetupStep::RedFlag => self.arena.red_flag.is_some(),
            SetupStep::BlueFlag => self.arena.blue_flag.is_some(),
            SetupStep::RedFlagReturn => self.arena.red_flag_return.is_some(),
            SetupStep::BlueFlagReturn => self.arena.blue_flag_return.is_some(),
            SetupStep::RedSpawns => self.arena.spawns(Team::Red).len() >= 2,
            SetupStep::BlueSpawns => self.arena.spawns(Team::Blue).len() >= 2,
            SetupStep::Corner1 => self.arena.corner1.is_some(),
            SetupStep::Corner2 => self.arena.corner2.is_some(),
            SetupStep::Confirm => true,
        }
    }

    /// Move to the next step once the current one is satisfied. At the
    /// confirm step the whole arena is validated and handed back.
    pub fn advance(&mut self) -> Result<SetupProgress, SetupError> {
        if !self.step_satisfied() {
            return Err(SetupError::StepIncomplete {
                step: self.step.describe(),
            });
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Ok(SetupProgress::Moved(next))
            }
            None => {
                let problems = self.arena.validation_errors();
                if !problems.is_empty() {
                    return Err(SetupError::Invalid { problems });
                }
                Ok(SetupProgress::Complete(self.arena.clone()))
            }
        }
    }
}
