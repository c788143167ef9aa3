use std::sync::Arc;

use agegate_state::SessionStore;
use agegate_state_memory::MemorySessionStore;

use crate::config::StateConfig;
use crate::error::ServerError;

/// Create a session-state store from the given configuration.
pub fn create_sessions(config: &StateConfig) -> Result<Arc<dyn SessionStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemorySessionStore::new())),
        other => Err(ServerError::Config(format!(
            "unknown state backend: {other}"
        ))),
    }
}
