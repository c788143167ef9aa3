//! Discord REST v10 wire types, limited to the fields the adapter touches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agegate_guild::{ChannelMessage, MessageEmbed};

/// Request body for a message-create call.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateMessage {
    /// Message text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Rich embed objects. Up to 10 embeds per message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<DiscordEmbed>,
}

impl From<&ChannelMessage> for CreateMessage {
    fn from(message: &ChannelMessage) -> Self {
        Self {
            content: message.content.clone(),
            embeds: message.embed.iter().map(DiscordEmbed::from).collect(),
        }
    }
}

/// A Discord embed object.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DiscordEmbed {
    /// Embed title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Embed description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Embed color as a decimal integer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,

    /// Embed fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<DiscordEmbedField>,

    /// Footer object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<DiscordEmbedFooter>,

    /// ISO 8601 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<&MessageEmbed> for DiscordEmbed {
    fn from(embed: &MessageEmbed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            color: embed.color,
            fields: embed
                .fields
                .iter()
                .map(|field| DiscordEmbedField {
                    name: field.name.clone(),
                    value: field.value.clone(),
                    inline: field.inline,
                })
                .collect(),
            footer: embed
                .footer
                .clone()
                .map(|text| DiscordEmbedFooter { text }),
            timestamp: embed.timestamp.map(|at| at.to_rfc3339()),
        }
    }
}

/// A field within a Discord embed.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DiscordEmbedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether this field should be displayed inline.
    pub inline: bool,
}

/// Footer for a Discord embed.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DiscordEmbedFooter {
    /// Footer text.
    pub text: String,
}

/// Request body for opening a DM channel.
#[derive(Debug, Serialize)]
pub(crate) struct CreateDm<'a> {
    /// The user to open the channel with.
    pub recipient_id: &'a str,
}

/// The DM channel object, reduced to its id.
#[derive(Debug, Deserialize)]
pub(crate) struct DmChannel {
    /// Channel id messages are posted to.
    pub id: String,
}

/// Request body for a guild ban.
#[derive(Debug, Serialize)]
pub(crate) struct CreateBan {
    /// How many seconds of the user's recent messages to delete.
    pub delete_message_seconds: u32,
}

/// A guild member from the member-list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MemberObject {
    /// The member's user object.
    pub user: MemberUser,
    /// Role ids the member holds.
    #[serde(default)]
    pub roles: Vec<String>,
    /// When the member joined the guild.
    pub joined_at: DateTime<Utc>,
}

/// The user object nested in a guild member.
#[derive(Debug, Deserialize)]
pub(crate) struct MemberUser {
    /// Snowflake id.
    pub id: String,
}

/// Error body Discord returns on failed calls.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,

    /// Seconds to wait, present on rate-limit responses.
    #[serde(default)]
    pub retry_after: Option<f64>,
}
