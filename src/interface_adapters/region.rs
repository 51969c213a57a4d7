// Default RegionGuard: a world with no protection system attached.

use crate::domain::ports::RegionGuard;
use crate::domain::Position;
use tracing::debug;

/// Permits everything and records nothing. Deployments with a real
/// world-protection system supply their own implementation.
pub struct OpenRegionGuard;

impl RegionGuard for OpenRegionGuard {
    fn is_protected(&self, _position: &Position) -> bool {
        false
    }

    fn create_region(
        &self,
        arena_name: &str,
        _corner1: Position,
        _corner2: Position,
    ) -> Result<(), String> {
        debug!(region = %arena_name, "no region backend, skipping region creation");
        Ok(())
    }
}
