use agegate_core::{RecordId, UserId, VerificationRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RecordError;

/// A store for verification records.
///
/// Implementations must be safe for concurrent use. Reviewing a record is a
/// one-shot transition: once `reviewed` is set it never changes, and
/// implementations must enforce that atomically.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Persists a new verification record.
    async fn add(&self, record: &VerificationRecord) -> Result<(), RecordError>;

    /// Retrieves a record by ID, or `None` if it does not exist.
    async fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, RecordError>;

    /// Lists all records awaiting review, oldest first.
    async fn pending(&self) -> Result<Vec<VerificationRecord>, RecordError>;

    /// Returns the most recent unreviewed record for a user, or `None` if
    /// every record of theirs has been reviewed.
    async fn latest_unreviewed_for_user(
        &self,
        user: &UserId,
    ) -> Result<Option<VerificationRecord>, RecordError>;

    /// Lists all records for a user, newest first.
    async fn for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, RecordError>;

    /// Marks a record as reviewed.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// record had already been reviewed. Fails with [`RecordError::NotFound`]
    /// if the record does not exist.
    async fn update_review(
        &self,
        id: &RecordId,
        reviewer: &UserId,
        verified: bool,
        notes: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool, RecordError>;

    /// Deletes reviewed records whose review completed before the cutoff.
    ///
    /// Unreviewed records are never purged. Returns the number of records
    /// deleted.
    async fn purge_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RecordError>;
}
