use async_trait::async_trait;
use tracing::info;

use agegate_core::{ChannelId, GuildId, RoleId, UserId};

use crate::actions::{GuildActions, GuildMember};
use crate::error::GuildError;
use crate::message::ChannelMessage;

/// A guild backend that only logs what it would do.
///
/// Lets the daemon run end to end without platform credentials. Role
/// listings are always empty, so the background sweeps become no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingGuild;

impl TracingGuild {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GuildActions for TracingGuild {
    async fn add_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError> {
        info!(guild = %guild, user = %user, role = %role, reason, "would add role");
        Ok(())
    }

    async fn remove_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError> {
        info!(guild = %guild, user = %user, role = %role, reason, "would remove role");
        Ok(())
    }

    async fn ban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        info!(guild = %guild, user = %user, reason, "would ban");
        Ok(())
    }

    async fn unban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        info!(guild = %guild, user = %user, reason, "would unban");
        Ok(())
    }

    async fn kick(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        info!(guild = %guild, user = %user, reason, "would kick");
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: &ChannelMessage,
    ) -> Result<(), GuildError> {
        info!(
            channel = %channel,
            content = message.content.as_deref().unwrap_or(""),
            has_embed = message.embed.is_some(),
            "would post channel message"
        );
        Ok(())
    }

    async fn send_dm(&self, user: &UserId, message: &ChannelMessage) -> Result<(), GuildError> {
        info!(
            user = %user,
            content = message.content.as_deref().unwrap_or(""),
            has_embed = message.embed.is_some(),
            "would send dm"
        );
        Ok(())
    }

    async fn members_with_role(
        &self,
        guild: &GuildId,
        role: &RoleId,
    ) -> Result<Vec<GuildMember>, GuildError> {
        info!(guild = %guild, role = %role, "would list members");
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
