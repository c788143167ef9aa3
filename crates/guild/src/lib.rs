pub mod actions;
pub mod error;
pub mod log;
pub mod message;
pub mod testing;

pub use actions::{GuildActions, GuildMember};
pub use error::GuildError;
pub use log::TracingGuild;
pub use message::{ChannelMessage, EmbedField, MessageEmbed, color};
