use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::MediaKind;
use crate::types::{RecordId, UserId};

/// A stored age-verification submission.
///
/// Records are created when a submission passes the spoof and estimation
/// checks, and transition exactly once from pending to reviewed. The
/// submitted media bytes are retained so staff can inspect what the
/// heuristic saw; the retention reaper deletes reviewed records after the
/// configured window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Unique record identifier.
    pub id: RecordId,

    /// Submitting user.
    pub user: UserId,

    /// Display name at submission time, kept for review context.
    pub display_name: String,

    /// Timestamp when the submission was accepted.
    pub submitted_at: DateTime<Utc>,

    /// Raw media bytes as submitted.
    pub media: Vec<u8>,

    /// Whether the media was a photo or a video.
    pub media_kind: MediaKind,

    /// Heuristic age estimate. Always set; submissions the heuristic cannot
    /// score are rejected before a record is created.
    pub estimated_age: f32,

    /// Whether a staff member has reviewed this record.
    pub reviewed: bool,

    /// Review outcome. Only meaningful once `reviewed` is set.
    pub verified: bool,

    /// Staff member who performed the review.
    pub reviewer: Option<UserId>,

    /// When the review happened.
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Free-form reviewer notes.
    pub notes: Option<String>,
}

impl VerificationRecord {
    /// Create a pending record with a fresh UUID-v4 id, submitted now.
    #[must_use]
    pub fn new(
        user: impl Into<UserId>,
        display_name: impl Into<String>,
        media: Vec<u8>,
        media_kind: MediaKind,
        estimated_age: f32,
    ) -> Self {
        Self {
            id: RecordId::new(Uuid::new_v4().to_string()),
            user: user.into(),
            display_name: display_name.into(),
            submitted_at: Utc::now(),
            media,
            media_kind,
            estimated_age,
            reviewed: false,
            verified: false,
            reviewer: None,
            reviewed_at: None,
            notes: None,
        }
    }

    /// Override the submission timestamp.
    #[must_use]
    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Whether this record still awaits staff review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.reviewed
    }
}
