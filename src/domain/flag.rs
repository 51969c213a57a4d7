// Per-team flag lifecycle: at base, carried, or dropped with a return timer.

use crate::domain::position::Position;
use crate::domain::PlayerId;

/// Where a flag currently is. The carrier and the dropped position live
/// inside their variants so only one can exist at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlagPhase {
    AtBase,
    Carried { carrier: PlayerId },
    Dropped { position: Position, return_in: u32 },
}

/// One team's flag within a running match.
#[derive(Debug, Clone)]
pub struct FlagState {
    anchor: Position,
    phase: FlagPhase,
}

impl FlagState {
    pub fn new(anchor: Position) -> Self {
        Self {
            anchor,
            phase: FlagPhase::AtBase,
        }
    }

    pub fn phase(&self) -> FlagPhase {
        self.phase
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn carrier(&self) -> Option<PlayerId> {
        match self.phase {
            FlagPhase::Carried { carrier } => Some(carrier),
            _ => None,
        }
    }

    /// The position a pickup attempt is measured against, if the flag is
    /// on the ground at all.
    pub fn ground_position(&self) -> Option<Position> {
        match self.phase {
            FlagPhase::AtBase => Some(self.anchor),
            FlagPhase::Dropped { position, .. } => Some(position),
            FlagPhase::Carried { .. } => None,
        }
    }

    /// Hand the flag to `carrier`. Fails while another player holds it.
    pub fn pick_up(&mut self, carrier: PlayerId) -> bool {
        match self.phase {
            FlagPhase::AtBase | FlagPhase::Dropped { .. } => {
                self.phase = FlagPhase::Carried { carrier };
                true
            }
            FlagPhase::Carried { .. } => false,
        }
    }

    /// Drop the carried flag at `position` and arm the auto-return timer.
    /// No-op unless `player` is the current carrier.
    pub fn drop_at(&mut self, player: PlayerId, position: Position, return_delay: u32) -> bool {
        match self.phase {
            FlagPhase::Carried { carrier } if carrier == player => {
                self.phase = FlagPhase::Dropped {
                    position,
                    return_in: return_delay,
                };
                true
            }
            _ => false,
        }
    }

    /// Send the flag home, whatever state it was in.
    pub fn return_home(&mut self) {
        self.phase = FlagPhase::AtBase;
    }

    /// One-second countdown step for a dropped flag. Returns true when the
    /// timer expired and the flag went home this tick.
    pub fn tick(&mut self) -> bool {
        if let FlagPhase::Dropped { position, return_in } = self.phase {
            if return_in <= 1 {
                self.phase = FlagPhase::AtBase;
                return true;
            }
            self.phase = FlagPhase::Dropped {
                position,
                return_in: return_in - 1,
            };
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn anchor() -> Position {
        Position::new(10.0, 64.0, 10.0)
    }

    #[test]
    fn pickup_of_a_carried_flag_fails() {
        let mut flag = FlagState::new(anchor());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(flag.pick_up(first));
        assert!(!flag.pick_up(second));
        assert_eq!(flag.carrier(), Some(first));
    }

    #[test]
    fn only_the_carrier_can_drop() {
        let mut flag = FlagState::new(anchor());
        let carrier = Uuid::new_v4();
        let other = Uuid::new_v4();
        flag.pick_up(carrier);

        assert!(!flag.drop_at(other, Position::default(), 30));
        assert!(flag.drop_at(carrier, Position::new(1.0, 2.0, 3.0), 30));
        assert!(matches!(flag.phase(), FlagPhase::Dropped { return_in: 30, .. }));
    }

    #[test]
    fn dropped_flag_auto_returns_when_the_timer_runs_out() {
        let mut flag = FlagState::new(anchor());
        let carrier = Uuid::new_v4();
        flag.pick_up(carrier);
        flag.drop_at(carrier, Position::new(1.0, 2.0, 3.0), 3);

        assert!(!flag.tick());
        assert!(!flag.tick());
        assert!(flag.tick());
        assert_eq!(flag.phase(), FlagPhase::AtBase);
        assert_eq!(flag.ground_position(), Some(anchor()));
    }

    #[test]
    fn carried_flag_has_no_ground_position() {
        let mut flag = FlagState::new(anchor());
        assert_eq!(flag.ground_position(), Some(anchor()));
        flag.pick_up(Uuid::new_v4());
        assert_eq!(flag.ground_position(), None);
    }
}
