use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agegate_core::{AppealId, MediaKind, RecordId, UserId, VerificationRecord};

/// Outcome of a verification submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The media passed intake and a record entered the review queue.
    Accepted {
        record_id: RecordId,
        estimated_age: f32,
        /// Whether the estimate fell below the minimum age.
        high_priority: bool,
    },
    /// The media was rejected before any record was created.
    Rejected {
        /// User-presentable rejection text.
        reason: String,
    },
    /// The submitter is still inside the cooldown window.
    OnCooldown {
        /// Time left until the next attempt is accepted.
        retry_after: Duration,
    },
}

/// Outcome of a staff review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The record the review was applied to.
    pub record_id: RecordId,
    /// `false` when the member was banned as underage.
    pub verified: bool,
}

/// Outcome of an appeal submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppealOutcome {
    /// The appeal entered the staff queue.
    Submitted { appeal_id: AppealId },
    /// A configured keyword denied the appeal on sight.
    AutoDenied { appeal_id: AppealId },
}

/// Review-queue entry without the media payload.
///
/// Listings carry this summary instead of the full record so the queue can
/// be rendered without shipping every submission's raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub record_id: RecordId,
    pub user: UserId,
    pub display_name: String,
    pub submitted_at: DateTime<Utc>,
    pub media_kind: MediaKind,
    pub estimated_age: f32,
    /// Whether the estimate fell below the minimum age.
    pub high_priority: bool,
}

impl PendingReview {
    pub(crate) fn from_record(record: &VerificationRecord, min_age: f32) -> Self {
        Self {
            record_id: record.id.clone(),
            user: record.user.clone(),
            display_name: record.display_name.clone(),
            submitted_at: record.submitted_at,
            media_kind: record.media_kind,
            estimated_age: record.estimated_age,
            high_priority: record.estimated_age < min_age,
        }
    }
}
