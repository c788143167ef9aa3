use async_trait::async_trait;
use chrono::{DateTime, Utc};

use agegate_core::{ChannelId, GuildId, RoleId, UserId};

use crate::error::GuildError;
use crate::message::ChannelMessage;

/// A guild member as returned by role listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    /// The member's user id.
    pub user: UserId,
    /// When the member joined the guild.
    pub joined_at: DateTime<Utc>,
}

impl GuildMember {
    #[must_use]
    pub fn new(user: impl Into<UserId>, joined_at: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            joined_at,
        }
    }
}

/// Trait for the platform operations the verification pipeline needs.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
/// Roles and channels are addressed by stable identifiers; display names only
/// exist as configuration labels.
///
/// There is no retry policy at this seam. Callers decide per call site
/// whether a failure is surfaced or logged and swallowed.
#[async_trait]
pub trait GuildActions: Send + Sync {
    /// Grant a role to a member.
    async fn add_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError>;

    /// Remove a role from a member.
    async fn remove_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError>;

    /// Ban a user from the guild.
    async fn ban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError>;

    /// Lift a ban.
    async fn unban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError>;

    /// Remove a member from the guild without banning them.
    async fn kick(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError>;

    /// Post a message to a channel.
    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: &ChannelMessage,
    ) -> Result<(), GuildError>;

    /// Send a direct message to a user.
    async fn send_dm(&self, user: &UserId, message: &ChannelMessage) -> Result<(), GuildError>;

    /// List every member holding a role, with join timestamps.
    async fn members_with_role(
        &self,
        guild: &GuildId,
        role: &RoleId,
    ) -> Result<Vec<GuildMember>, GuildError>;

    /// Short backend name for logging.
    fn name(&self) -> &str;
}
