use agegate_core::{AppealId, AppealRecord, AppealStats, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RecordError;

/// A store for ban appeals.
///
/// Deciding an appeal is a one-shot transition, same as reviewing a
/// verification record: the first decision wins and later attempts are
/// reported rather than applied.
#[async_trait]
pub trait AppealStore: Send + Sync {
    /// Persists a new appeal.
    async fn add(&self, appeal: &AppealRecord) -> Result<(), RecordError>;

    /// Retrieves an appeal by ID, or `None` if it does not exist.
    async fn get(&self, id: &AppealId) -> Result<Option<AppealRecord>, RecordError>;

    /// Lists all undecided appeals, oldest first.
    async fn pending(&self) -> Result<Vec<AppealRecord>, RecordError>;

    /// Records a decision on an appeal.
    ///
    /// Returns the updated appeal if this call performed the transition, or
    /// `None` if the appeal had already been decided. Fails with
    /// [`RecordError::NotFound`] if the appeal does not exist.
    async fn decide(
        &self,
        id: &AppealId,
        decided_by: &UserId,
        accept: bool,
        notes: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<AppealRecord>, RecordError>;

    /// Returns aggregate appeal counts.
    async fn stats(&self) -> Result<AppealStats, RecordError>;
}
