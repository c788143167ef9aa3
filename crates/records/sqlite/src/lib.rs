pub mod config;
pub mod migrations;
pub mod store;

pub use config::SqliteRecordsConfig;
pub use store::{SqliteAppealStore, SqliteVerificationStore};
