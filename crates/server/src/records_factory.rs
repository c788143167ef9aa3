use std::sync::Arc;

use agegate_records::{AppealStore, VerificationStore};
use agegate_records_memory::{MemoryAppealStore, MemoryVerificationStore};
use agegate_records_sqlite::{SqliteAppealStore, SqliteRecordsConfig, SqliteVerificationStore};

use crate::config::RecordsConfig;
use crate::error::ServerError;

/// Create a verification record store from the given configuration.
pub async fn create_verifications(
    config: &RecordsConfig,
) -> Result<Arc<dyn VerificationStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryVerificationStore::new())),
        "sqlite" => {
            let sqlite_config = SqliteRecordsConfig::new(&config.path);
            let store = SqliteVerificationStore::new(&sqlite_config)
                .await
                .map_err(|e| ServerError::Config(format!("records sqlite: {e}")))?;
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!(
            "unknown records backend: {other}"
        ))),
    }
}

/// Create an appeal record store from the given configuration.
pub async fn create_appeals(config: &RecordsConfig) -> Result<Arc<dyn AppealStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryAppealStore::new())),
        "sqlite" => {
            let sqlite_config = SqliteRecordsConfig::new(&config.path);
            let store = SqliteAppealStore::new(&sqlite_config)
                .await
                .map_err(|e| ServerError::Config(format!("records sqlite: {e}")))?;
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!(
            "unknown records backend: {other}"
        ))),
    }
}
