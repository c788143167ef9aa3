pub mod audit;
pub mod config;
pub mod rest;
pub(crate) mod types;

pub use audit::ChannelAuditSink;
pub use config::DiscordConfig;
pub use rest::DiscordGuild;
