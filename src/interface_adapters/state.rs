use crate::domain::ports::DataStore;
use crate::use_cases::MatchRegistry;
use std::sync::Arc;

// Shared application state for the HTTP handlers.
pub struct AppState {
    pub registry: Arc<MatchRegistry>,
    pub store: Arc<dyn DataStore>,
}
