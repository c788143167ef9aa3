use serde::{Deserialize, Serialize};

use crate::band::BandTable;
use crate::error::ConfigError;
use crate::template::validate_template;
use crate::types::{ChannelId, GuildId, RoleId};

/// Top-level gate configuration.
///
/// Every field carries a default so a partial (or empty) JSON document
/// deserializes into a runnable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// The chat server this gate operates on.
    #[serde(default)]
    pub guild: GuildId,

    /// Role identifiers involved in the verification lifecycle.
    #[serde(default)]
    pub roles: RoleConfig,

    /// Channels the gate posts staff-facing messages to.
    #[serde(default)]
    pub channels: ChannelConfig,

    /// Estimation and intake tuning.
    #[serde(default)]
    pub verification: VerificationSettings,

    /// Ban appeal handling.
    #[serde(default)]
    pub appeals: AppealSettings,

    /// Join-burst detection.
    #[serde(default)]
    pub raid: RaidSettings,

    /// Scheduled sweep thresholds.
    #[serde(default)]
    pub sweeps: SweepSettings,

    /// Operator-editable user-facing messages.
    #[serde(default)]
    pub messages: MessageTemplates,
}

impl GateConfig {
    /// Validate cross-field constraints that serde defaults cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.verification;
        if v.cooldown_minutes == 0 {
            return Err(ConfigError::Invalid(
                "verification.cooldown_minutes must be at least 1".into(),
            ));
        }
        if v.retention_days == 0 {
            return Err(ConfigError::Invalid(
                "verification.retention_days must be at least 1".into(),
            ));
        }
        if !v.min_age.is_finite() || !v.adult_age.is_finite() || v.min_age > v.adult_age {
            return Err(ConfigError::Invalid(format!(
                "verification ages are inconsistent: min_age {} adult_age {}",
                v.min_age, v.adult_age
            )));
        }
        if !v.blur_threshold.is_finite() || v.blur_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "verification.blur_threshold {} is invalid",
                v.blur_threshold
            )));
        }
        v.bands.validate()?;
        if self.appeals.cooldown_days == 0 {
            return Err(ConfigError::Invalid(
                "appeals.cooldown_days must be at least 1".into(),
            ));
        }
        if self.raid.window_seconds == 0 || self.raid.join_threshold == 0 {
            return Err(ConfigError::Invalid(
                "raid.window_seconds and raid.join_threshold must be at least 1".into(),
            ));
        }
        if self.sweeps.auto_kick_days == 0 {
            return Err(ConfigError::Invalid(
                "sweeps.auto_kick_days must be at least 1".into(),
            ));
        }
        self.messages.validate()
    }
}

/// A role id plus a cached human-readable label.
///
/// The id is authoritative; the label is only carried for log and embed
/// readability and may drift from the platform-side name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default)]
    pub id: RoleId,
    #[serde(default)]
    pub label: String,
}

impl RoleRef {
    #[must_use]
    pub fn new(id: impl Into<RoleId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A channel id plus a cached human-readable label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRef {
    #[serde(default)]
    pub id: ChannelId,
    #[serde(default)]
    pub label: String,
}

impl ChannelRef {
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Roles granted and removed across the verification lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Held by members who have not started verification.
    #[serde(default)]
    pub unverified: RoleRef,

    /// Held while a submission waits for staff review.
    #[serde(default)]
    pub awaiting_review: RoleRef,

    /// Granted when staff confirm the member meets the minimum age.
    #[serde(default)]
    pub verified_13plus: RoleRef,

    /// Granted when staff additionally approve adult access.
    #[serde(default)]
    pub verified_18plus: RoleRef,

    /// Staff role mentioned in review alerts.
    #[serde(default)]
    pub staff: RoleRef,
}

/// Channels the gate posts to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Moderation log: review alerts, sweep results, raid warnings.
    #[serde(default)]
    pub mod_log: ChannelRef,

    /// Where incoming appeals are posted for staff.
    #[serde(default)]
    pub appeals: ChannelRef,
}

/// Estimation and intake tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// Minimum age to remain on the server. Estimates below this flag the
    /// submission as high priority.
    #[serde(default = "default_min_age")]
    pub min_age: f32,

    /// Age at which a submission is flagged as potentially adult.
    #[serde(default = "default_adult_age")]
    pub adult_age: f32,

    /// Minutes a user must wait between accepted submissions.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,

    /// Days reviewed records are retained before the reaper deletes them.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Laplacian variance below which a photo is considered too blurry.
    #[serde(default = "default_blur_threshold")]
    pub blur_threshold: f64,

    /// Ratio-to-age policy table.
    #[serde(default)]
    pub bands: BandTable,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            min_age: default_min_age(),
            adult_age: default_adult_age(),
            cooldown_minutes: default_cooldown_minutes(),
            retention_days: default_retention_days(),
            blur_threshold: default_blur_threshold(),
            bands: BandTable::default(),
        }
    }
}

/// Ban appeal handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppealSettings {
    /// Days a user must wait after a denied appeal before appealing again.
    #[serde(default = "default_appeal_cooldown_days")]
    pub cooldown_days: u32,

    /// Case-insensitive substrings that auto-deny an appeal on sight.
    #[serde(default)]
    pub auto_deny_keywords: Vec<String>,
}

impl Default for AppealSettings {
    fn default() -> Self {
        Self {
            cooldown_days: default_appeal_cooldown_days(),
            auto_deny_keywords: Vec::new(),
        }
    }
}

/// Join-burst detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidSettings {
    /// Whether the raid watch runs at all.
    #[serde(default = "default_raid_enabled")]
    pub enabled: bool,

    /// Length of the join-counting window in seconds.
    #[serde(default = "default_raid_window_seconds")]
    pub window_seconds: u64,

    /// Joins within one window that trigger an alert.
    #[serde(default = "default_raid_join_threshold")]
    pub join_threshold: u64,
}

impl Default for RaidSettings {
    fn default() -> Self {
        Self {
            enabled: default_raid_enabled(),
            window_seconds: default_raid_window_seconds(),
            join_threshold: default_raid_join_threshold(),
        }
    }
}

/// Scheduled sweep thresholds. Sweep cadence lives with the background
/// processor; these are the day counts the sweeps compare against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Days an unverified member may stay before being kicked.
    #[serde(default = "default_auto_kick_days")]
    pub auto_kick_days: u32,

    /// Days-since-join values on which a verification reminder is sent.
    ///
    /// A list rather than a single threshold so members are nudged a few
    /// times without being messaged on every sweep.
    #[serde(default = "default_reminder_days")]
    pub reminder_days: Vec<u32>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            auto_kick_days: default_auto_kick_days(),
            reminder_days: default_reminder_days(),
        }
    }
}

/// Operator-editable user-facing messages.
///
/// Templates use `{name}` placeholders; see each field for the variables it
/// receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    /// DM after an accepted submission. No variables.
    #[serde(default = "default_submission_received")]
    pub submission_received: String,

    /// DM after an accepted submission whose estimate fell below the
    /// minimum age. No variables.
    #[serde(default = "default_submission_flagged")]
    pub submission_flagged: String,

    /// DM sent before an underage ban. No variables.
    #[serde(default = "default_ban_notice")]
    pub ban_notice: String,

    /// DM after staff verify the member. No variables.
    #[serde(default = "default_approval_notice")]
    pub approval_notice: String,

    /// DM after adult access is granted. Variables: `{policy}`.
    #[serde(default = "default_adult_approved")]
    pub adult_approved: String,

    /// DM after adult access is declined. No variables.
    #[serde(default = "default_adult_denied")]
    pub adult_denied: String,

    /// Policy text substituted into `adult_approved`.
    #[serde(default = "default_adult_content_policy")]
    pub adult_content_policy: String,

    /// DM sent before an auto-kick. Variables: `{days}`.
    #[serde(default = "default_kick_notice")]
    pub kick_notice: String,

    /// Verification reminder DM. Variables: `{days}` remaining.
    #[serde(default = "default_reminder")]
    pub reminder: String,

    /// DM confirming an appeal was received. No variables.
    #[serde(default = "default_appeal_received")]
    pub appeal_received: String,

    /// DM for a keyword auto-denial. No variables.
    #[serde(default = "default_appeal_auto_denied")]
    pub appeal_auto_denied: String,

    /// DM for an accepted appeal. No variables.
    #[serde(default = "default_appeal_accepted")]
    pub appeal_accepted: String,

    /// DM for a denied appeal. Variables: `{days}` until the next attempt.
    #[serde(default = "default_appeal_denied")]
    pub appeal_denied: String,
}

impl MessageTemplates {
    /// Validate every template against the size and emptiness limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named: &[(&str, &str)] = &[
            ("submission_received", &self.submission_received),
            ("submission_flagged", &self.submission_flagged),
            ("ban_notice", &self.ban_notice),
            ("approval_notice", &self.approval_notice),
            ("adult_approved", &self.adult_approved),
            ("adult_denied", &self.adult_denied),
            ("adult_content_policy", &self.adult_content_policy),
            ("kick_notice", &self.kick_notice),
            ("reminder", &self.reminder),
            ("appeal_received", &self.appeal_received),
            ("appeal_auto_denied", &self.appeal_auto_denied),
            ("appeal_accepted", &self.appeal_accepted),
            ("appeal_denied", &self.appeal_denied),
        ];
        for (name, content) in named {
            validate_template(name, content)?;
        }
        Ok(())
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            submission_received: default_submission_received(),
            submission_flagged: default_submission_flagged(),
            ban_notice: default_ban_notice(),
            approval_notice: default_approval_notice(),
            adult_approved: default_adult_approved(),
            adult_denied: default_adult_denied(),
            adult_content_policy: default_adult_content_policy(),
            kick_notice: default_kick_notice(),
            reminder: default_reminder(),
            appeal_received: default_appeal_received(),
            appeal_auto_denied: default_appeal_auto_denied(),
            appeal_accepted: default_appeal_accepted(),
            appeal_denied: default_appeal_denied(),
        }
    }
}

fn default_min_age() -> f32 {
    13.0
}

fn default_adult_age() -> f32 {
    18.0
}

fn default_cooldown_minutes() -> u64 {
    30
}

fn default_retention_days() -> u32 {
    30
}

fn default_blur_threshold() -> f64 {
    100.0
}

fn default_appeal_cooldown_days() -> u32 {
    7
}

fn default_raid_enabled() -> bool {
    true
}

fn default_raid_window_seconds() -> u64 {
    60
}

fn default_raid_join_threshold() -> u64 {
    10
}

fn default_auto_kick_days() -> u32 {
    7
}

fn default_reminder_days() -> Vec<u32> {
    vec![3, 5]
}

fn default_submission_received() -> String {
    "Thanks for your submission. A staff member will review your verification shortly.".into()
}

fn default_submission_flagged() -> String {
    "Thanks for your submission. It has been flagged for careful review; a staff member will \
     look at it shortly."
        .into()
}

fn default_ban_notice() -> String {
    "You have been banned because you do not meet the minimum age requirement. If you believe \
     this is a mistake, you may submit an appeal."
        .into()
}

fn default_approval_notice() -> String {
    "Your age verification has been approved. You now have access to the 13+ areas of the \
     server. If you are 18 or older, staff can additionally review you for 18+ access."
        .into()
}

fn default_adult_approved() -> String {
    "You have been approved for 18+ access. {policy}".into()
}

fn default_adult_denied() -> String {
    "Your 18+ review was declined. Your existing access is unchanged.".into()
}

fn default_adult_content_policy() -> String {
    "Mature language and topics are permitted within the server rules.".into()
}

fn default_kick_notice() -> String {
    "You were removed because age verification was not completed within {days} days. You are \
     welcome to rejoin and verify at any time."
        .into()
}

fn default_reminder() -> String {
    "A reminder that this server requires age verification. You have {days} days left to \
     verify before you are automatically removed."
        .into()
}

fn default_appeal_received() -> String {
    "Your appeal has been received and will be reviewed by staff.".into()
}

fn default_appeal_auto_denied() -> String {
    "Your appeal was automatically denied.".into()
}

fn default_appeal_accepted() -> String {
    "Your appeal has been accepted and your ban has been lifted. You may rejoin the server."
        .into()
}

fn default_appeal_denied() -> String {
    "Your appeal has been denied. You may submit a new appeal in {days} days.".into()
}
