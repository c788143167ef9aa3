use chrono::{DateTime, Utc};

/// Embed accent colors used by staff-facing notifications, as RGB bytes.
pub mod color {
    /// Urgent alerts: underage estimates, raid warnings.
    pub const RED: u32 = 0xED_42_45;
    /// Approvals and accepted appeals.
    pub const GREEN: u32 = 0x57_F2_87;
    /// Routine review-queue notifications.
    pub const BLUE: u32 = 0x34_98_DB;
    /// Flagged-for-attention notices.
    pub const YELLOW: u32 = 0xFE_E7_5C;
}

/// A message for a channel or DM: plain text, a rich embed, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Plain text body.
    pub content: Option<String>,
    /// Optional rich embed block.
    pub embed: Option<MessageEmbed>,
}

impl ChannelMessage {
    /// A plain-text message.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
        }
    }

    /// An embed-only message.
    #[must_use]
    pub fn embed(embed: MessageEmbed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
        }
    }

    /// Attach an embed to a text message.
    #[must_use]
    pub fn with_embed(mut self, embed: MessageEmbed) -> Self {
        self.embed = Some(embed);
        self
    }
}

/// A rich embed block for staff notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageEmbed {
    /// Embed title.
    pub title: Option<String>,
    /// Embed description.
    pub description: Option<String>,
    /// Accent color, see [`color`].
    pub color: Option<u32>,
    /// Name/value detail fields.
    pub fields: Vec<EmbedField>,
    /// Footer text.
    pub footer: Option<String>,
    /// Timestamp shown alongside the footer.
    pub timestamp: Option<DateTime<Utc>>,
}

impl MessageEmbed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the accent color.
    #[must_use]
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Append a detail field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Set the footer text.
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A name/value detail line within an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the field should render inline.
    pub inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message() {
        let msg = ChannelMessage::text("hello");
        assert_eq!(msg.content.as_deref(), Some("hello"));
        assert!(msg.embed.is_none());
    }

    #[test]
    fn embed_builder() {
        let embed = MessageEmbed::new()
            .with_title("New submission")
            .with_description("user-1 submitted a photo")
            .with_color(color::BLUE)
            .with_field("Estimated age", "15.0", true)
            .with_field("Media", "photo", true)
            .with_footer("agegate");

        assert_eq!(embed.title.as_deref(), Some("New submission"));
        assert_eq!(embed.color, Some(color::BLUE));
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "Estimated age");
        assert!(embed.fields[0].inline);
    }

    #[test]
    fn text_with_embed() {
        let msg = ChannelMessage::text("@here").with_embed(MessageEmbed::new().with_title("t"));
        assert!(msg.content.is_some());
        assert!(msg.embed.is_some());
    }
}
