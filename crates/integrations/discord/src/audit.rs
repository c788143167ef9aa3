use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use agegate_audit::{AuditError, AuditEvent, AuditSink};
use agegate_core::ChannelId;
use agegate_guild::{ChannelMessage, GuildActions, MessageEmbed, color};

/// Forwards audit events to a staff channel as embeds.
///
/// Storage stays someone else's job; pair this with a storage sink through
/// `FanoutAuditSink` when events must also remain queryable.
pub struct ChannelAuditSink {
    guild: Arc<dyn GuildActions>,
    channel: ChannelId,
}

impl ChannelAuditSink {
    pub fn new(guild: Arc<dyn GuildActions>, channel: ChannelId) -> Self {
        Self { guild, channel }
    }

    fn render(event: &AuditEvent) -> ChannelMessage {
        let mut embed = MessageEmbed::new()
            .with_title(event.kind.to_string())
            .with_description(event.summary.clone())
            .with_color(if event.urgent { color::RED } else { color::BLUE })
            .with_field("Actor", event.actor.to_string(), true)
            .with_timestamp(event.created_at);
        if let Some(subject) = &event.subject {
            embed = embed.with_field("Subject", subject.to_string(), true);
        }
        embed = embed.with_footer(format!("Event {}", event.id));

        if event.urgent {
            ChannelMessage::text("@here").with_embed(embed)
        } else {
            ChannelMessage::embed(embed)
        }
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let message = Self::render(&event);
        self.guild
            .send_channel_message(&self.channel, &message)
            .await
            .map_err(|e| AuditError::Delivery(e.to_string()))?;
        debug!(event = %event.id, "audit event forwarded to channel");
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "discord-channel"
    }
}
