//! Staff-facing channel notifications.
//!
//! Builders for the embeds the pipeline posts to the mod-log and appeals
//! channels. Formatting only; delivery stays with the caller.

use chrono::Utc;

use agegate_core::{AppealRecord, GateConfig, VerificationRecord};
use agegate_guild::{color, ChannelMessage, MessageEmbed};

/// Platform embed fields cap out at 1024 characters; clip below that.
const FIELD_CLIP: usize = 1000;

/// Review-queue alert for a fresh submission.
pub(crate) fn review_alert(
    config: &GateConfig,
    record: &VerificationRecord,
    high_priority: bool,
    potential_adult: bool,
) -> ChannelMessage {
    let status = if high_priority {
        "Potential underage"
    } else if potential_adult {
        "Potential 18+"
    } else {
        "Awaiting review"
    };
    let accent = if high_priority { color::RED } else { color::BLUE };

    let embed = MessageEmbed::new()
        .with_title("New verification submission")
        .with_color(accent)
        .with_field(
            "User",
            format!("{} ({})", record.display_name, record.user),
            true,
        )
        .with_field("Estimated age", format!("{:.1}", record.estimated_age), true)
        .with_field("Media", record.media_kind.as_str(), true)
        .with_field("Status", status, false)
        .with_footer(format!("Record {}", record.id))
        .with_timestamp(record.submitted_at);

    if high_priority {
        let mention = match staff_mention(config) {
            Some(staff) => format!("{staff} @here - Urgent review required!"),
            None => "@here - Urgent review required!".to_owned(),
        };
        ChannelMessage::text(mention).with_embed(embed)
    } else {
        ChannelMessage::embed(embed)
    }
}

/// Appeals-channel alert for a newly submitted appeal.
pub(crate) fn appeal_alert(config: &GateConfig, appeal: &AppealRecord) -> ChannelMessage {
    let mut embed = MessageEmbed::new()
        .with_title("New ban appeal")
        .with_color(color::YELLOW)
        .with_field("User", appeal.user.as_str(), true)
        .with_field("Claimed age", clip(&appeal.claimed_age, FIELD_CLIP), true)
        .with_field("Reason", clip(&appeal.reason, FIELD_CLIP), false)
        .with_field(
            "Why reconsider",
            clip(&appeal.reconsideration, FIELD_CLIP),
            false,
        );
    if let Some(ref proof) = appeal.proof {
        embed = embed.with_field("Proof", clip(proof, FIELD_CLIP), false);
    }
    let embed = embed
        .with_footer(format!("Appeal {}", appeal.id))
        .with_timestamp(appeal.submitted_at);

    let mention = match staff_mention(config) {
        Some(staff) => format!("{staff} @here"),
        None => "@here".to_owned(),
    };
    ChannelMessage::text(mention).with_embed(embed)
}

/// Mod-log alert for a join burst.
pub(crate) fn raid_alert(config: &GateConfig, joins: u64, window_seconds: u64) -> ChannelMessage {
    let embed = MessageEmbed::new()
        .with_title("Possible raid in progress")
        .with_description(format!(
            "{joins} members joined within the last {window_seconds} seconds."
        ))
        .with_color(color::RED)
        .with_field("Joins", joins.to_string(), true)
        .with_field("Window", format!("{window_seconds}s"), true)
        .with_timestamp(Utc::now());

    let mention = match staff_mention(config) {
        Some(staff) => format!("{staff} @here - Possible raid detected!"),
        None => "@here - Possible raid detected!".to_owned(),
    };
    ChannelMessage::text(mention).with_embed(embed)
}

/// Role mention for the configured staff role, when one is set.
fn staff_mention(config: &GateConfig) -> Option<String> {
    let staff = &config.roles.staff.id;
    if staff.as_str().is_empty() {
        return None;
    }
    Some(format!("<@&{staff}>"))
}

/// Truncate to at most `max_chars` characters, respecting char boundaries.
fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_owned(),
        None => text.to_owned(),
    }
}
