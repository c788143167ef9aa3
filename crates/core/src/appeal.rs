use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{AppealId, UserId};

/// Lifecycle state of a ban appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    /// Waiting for a staff decision.
    Pending,
    /// Accepted; the ban was lifted.
    Accepted,
    /// Denied, either by staff or by the keyword filter.
    Denied,
}

impl AppealStatus {
    /// Stable string form used in storage and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ban appeal submitted by a removed user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppealRecord {
    /// Unique appeal identifier.
    pub id: AppealId,

    /// The banned user appealing.
    pub user: UserId,

    /// When the appeal was submitted.
    pub submitted_at: DateTime<Utc>,

    /// Why the user believes the ban was wrong.
    pub reason: String,

    /// The age the user now claims, as free text.
    pub claimed_age: String,

    /// Optional reference to supporting evidence.
    #[serde(default)]
    pub proof: Option<String>,

    /// Why the decision should be reconsidered.
    pub reconsideration: String,

    /// Platform message id the appeal form was reached from, when known.
    #[serde(default)]
    pub origin_message_id: Option<String>,

    /// Current lifecycle state.
    pub status: AppealStatus,

    /// Staff member who decided the appeal.
    pub decided_by: Option<UserId>,

    /// When the decision was made.
    pub decided_at: Option<DateTime<Utc>>,

    /// Decision context, e.g. the keyword that triggered an automatic denial.
    pub decision_notes: Option<String>,
}

impl AppealRecord {
    /// Create a pending appeal with a fresh UUID-v4 id, submitted now.
    #[must_use]
    pub fn new(
        user: impl Into<UserId>,
        reason: impl Into<String>,
        claimed_age: impl Into<String>,
        reconsideration: impl Into<String>,
    ) -> Self {
        Self {
            id: AppealId::new(Uuid::new_v4().to_string()),
            user: user.into(),
            submitted_at: Utc::now(),
            reason: reason.into(),
            claimed_age: claimed_age.into(),
            proof: None,
            reconsideration: reconsideration.into(),
            origin_message_id: None,
            status: AppealStatus::Pending,
            decided_by: None,
            decided_at: None,
            decision_notes: None,
        }
    }

    /// Attach a proof reference.
    #[must_use]
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.proof = Some(proof.into());
        self
    }

    /// Record which platform message the appeal originated from.
    #[must_use]
    pub fn with_origin_message(mut self, message_id: impl Into<String>) -> Self {
        self.origin_message_id = Some(message_id.into());
        self
    }

    /// Whether this appeal still awaits a staff decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == AppealStatus::Pending
    }
}

/// Aggregate appeal counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealStats {
    pub total: u64,
    pub accepted: u64,
    pub denied: u64,
    pub pending: u64,
}

impl AppealStats {
    /// Fraction of decided appeals that were accepted, in `[0, 1]`.
    ///
    /// Returns `0.0` when nothing has been decided yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn acceptance_rate(&self) -> f64 {
        let decided = self.accepted + self.denied;
        if decided == 0 {
            return 0.0;
        }
        self.accepted as f64 / decided as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appeal_creation() {
        let appeal = AppealRecord::new("user-9", "wrong ban", "19", "I can verify again");
        assert!(appeal.is_pending());
        assert!(appeal.proof.is_none());
        assert!(appeal.decided_by.is_none());
        assert_eq!(appeal.status, AppealStatus::Pending);
    }

    #[test]
    fn appeal_builders() {
        let appeal = AppealRecord::new("user-9", "r", "18", "rc")
            .with_proof("https://example.com/id")
            .with_origin_message("msg-100");
        assert_eq!(appeal.proof.as_deref(), Some("https://example.com/id"));
        assert_eq!(appeal.origin_message_id.as_deref(), Some("msg-100"));
    }

    #[test]
    fn acceptance_rate_ignores_pending() {
        let stats = AppealStats {
            total: 10,
            accepted: 3,
            denied: 1,
            pending: 6,
        };
        assert!((stats.acceptance_rate() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn acceptance_rate_with_no_decisions() {
        let stats = AppealStats {
            total: 2,
            pending: 2,
            ..AppealStats::default()
        };
        assert!((stats.acceptance_rate()).abs() < 1e-9);
    }
}
