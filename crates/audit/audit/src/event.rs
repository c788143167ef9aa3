use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use agegate_core::{GuildId, UserId};

/// The kind of pipeline transition an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A media submission entered the review queue.
    Submission,
    /// A staff member reviewed a submission.
    Review,
    /// A staff member decided an 18+ access request.
    AdultReview,
    /// An appeal was submitted or decided.
    Appeal,
    /// A member was kicked by the unverified sweep.
    Kick,
    /// The join-rate watcher fired.
    RaidAlert,
    /// The retention reaper purged reviewed records.
    Retention,
}

impl AuditKind {
    /// Stable string form used in storage and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Review => "review",
            Self::AdultReview => "adult_review",
            Self::Appeal => "appeal",
            Self::Kick => "kick",
            Self::RaidAlert => "raid_alert",
            Self::Retention => "retention",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed an audited transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActor {
    /// A background task or automatic rule.
    System,
    /// A staff member acting through the review surface.
    Staff(UserId),
}

impl fmt::Display for AuditActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Staff(id) => f.write_str(id.as_str()),
        }
    }
}

/// A single audit event capturing one verification pipeline transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event (UUID v7, so IDs sort by time).
    pub id: String,

    /// Guild the transition happened in.
    pub guild: GuildId,
    /// What kind of transition this records.
    pub kind: AuditKind,
    /// Who performed it.
    pub actor: AuditActor,
    /// The member the transition concerns, when there is a single one.
    /// Raid alerts and retention sweeps have no single subject.
    pub subject: Option<UserId>,

    /// Human-readable one-line summary.
    pub summary: String,
    /// Structured detail for dashboards and channel formatting.
    pub detail: serde_json::Value,
    /// Whether the event warrants immediate staff attention.
    pub urgent: bool,

    /// When the event was created.
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new event with a fresh time-ordered id, created now.
    #[must_use]
    pub fn new(
        guild: impl Into<GuildId>,
        kind: AuditKind,
        actor: AuditActor,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            guild: guild.into(),
            kind,
            actor,
            subject: None,
            summary: summary.into(),
            detail: serde_json::Value::Null,
            urgent: false,
            created_at: Utc::now(),
        }
    }

    /// Set the member the transition concerns.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<UserId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach structured detail.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }

    /// Flag the event as needing immediate staff attention.
    #[must_use]
    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

/// Query parameters for searching recorded audit events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Filter by event kind.
    pub kind: Option<AuditKind>,
    /// Filter by subject user id.
    pub subject: Option<UserId>,
    /// Only urgent events.
    pub urgent_only: bool,
    /// Only events created at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only events created at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default 50, max 1000).
    pub limit: Option<u32>,
    /// Number of events to skip for pagination.
    pub offset: Option<u32>,
}

impl AuditQuery {
    /// Return the effective limit, clamped to 1..=1000, defaulting to 50.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    /// Return the effective offset, defaulting to 0.
    #[must_use]
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A paginated page of audit events, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    /// The events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total number of events matching the query (before pagination).
    pub total: u64,
    /// The limit used for this page.
    pub limit: u32,
    /// The offset used for this page.
    pub offset: u32,
}
