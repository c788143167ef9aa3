use std::sync::Arc;

use agegate_discord::{DiscordConfig, DiscordGuild};
use agegate_guild::{GuildActions, TracingGuild};

use crate::config::DiscordSection;
use crate::error::ServerError;

/// Create a guild-actions backend from the given configuration.
///
/// With Discord disabled the tracing backend is used, which logs every
/// action instead of executing it.
pub fn create_guild(config: &DiscordSection) -> Result<Arc<dyn GuildActions>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(TracingGuild::new()));
    }

    if config.token.is_empty() {
        return Err(ServerError::Config(
            "discord.token is required when discord is enabled".into(),
        ));
    }

    let mut discord_config = DiscordConfig::new(&config.token);
    if let Some(base) = &config.api_base {
        discord_config = discord_config.with_api_base(base);
    }
    Ok(Arc::new(DiscordGuild::new(discord_config)))
}
