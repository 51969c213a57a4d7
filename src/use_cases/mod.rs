// Use cases layer: the match lifecycle workflows.

pub mod match_core;
pub mod match_task;
pub mod registry;
pub mod respawn;
pub mod setup;
pub mod types;

pub use match_core::MatchCore;
pub use registry::{MatchHandle, MatchRegistry, RegistrySettings};
pub use types::{EngineError, GameSettings, MatchCommand, MatchPhase, MatchSnapshot, OutcomeEvent};
