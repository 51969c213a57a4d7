// Domain layer: core game values and rules.

pub mod arena;
pub mod flag;
pub mod mvp;
pub mod ports;
pub mod position;
pub mod progression;
pub mod stats;
pub mod team;

pub use arena::Arena;
pub use flag::{FlagPhase, FlagState};
pub use position::Position;
pub use stats::{MatchCounters, PlayerStats, StatDelta};
pub use team::{PerTeam, Team};

/// Players are addressed by stable unique ids handed in by the caller.
pub type PlayerId = uuid::Uuid;
