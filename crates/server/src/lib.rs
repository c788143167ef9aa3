pub mod api;
pub mod audit_factory;
pub mod config;
pub mod error;
pub mod guild_factory;
pub mod records_factory;
pub mod state_factory;
