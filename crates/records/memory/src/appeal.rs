use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use agegate_core::{AppealId, AppealRecord, AppealStats, AppealStatus, UserId};
use agegate_records::appeal::AppealStore;
use agegate_records::error::RecordError;

/// In-memory appeal store using `DashMap`. Suitable for development and
/// tests.
pub struct MemoryAppealStore {
    appeals: DashMap<AppealId, AppealRecord>,
}

impl MemoryAppealStore {
    /// Create a new empty in-memory appeal store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            appeals: DashMap::new(),
        }
    }
}

impl Default for MemoryAppealStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppealStore for MemoryAppealStore {
    async fn add(&self, appeal: &AppealRecord) -> Result<(), RecordError> {
        self.appeals.insert(appeal.id.clone(), appeal.clone());
        Ok(())
    }

    async fn get(&self, id: &AppealId) -> Result<Option<AppealRecord>, RecordError> {
        Ok(self.appeals.get(id).map(|a| a.value().clone()))
    }

    async fn pending(&self) -> Result<Vec<AppealRecord>, RecordError> {
        let mut pending: Vec<AppealRecord> = self
            .appeals
            .iter()
            .filter(|entry| entry.value().is_pending())
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(pending)
    }

    async fn decide(
        &self,
        id: &AppealId,
        decided_by: &UserId,
        accept: bool,
        notes: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<AppealRecord>, RecordError> {
        // The shard guard from get_mut serializes racing deciders.
        let Some(mut appeal) = self.appeals.get_mut(id) else {
            return Err(RecordError::NotFound(id.to_string()));
        };
        if !appeal.is_pending() {
            return Ok(None);
        }
        appeal.status = if accept {
            AppealStatus::Accepted
        } else {
            AppealStatus::Denied
        };
        appeal.decided_by = Some(decided_by.clone());
        appeal.decided_at = Some(decided_at);
        appeal.decision_notes = notes.map(ToOwned::to_owned);
        Ok(Some(appeal.clone()))
    }

    async fn stats(&self) -> Result<AppealStats, RecordError> {
        let mut stats = AppealStats::default();
        for entry in &self.appeals {
            stats.total += 1;
            match entry.value().status {
                AppealStatus::Pending => stats.pending += 1,
                AppealStatus::Accepted => stats.accepted += 1,
                AppealStatus::Denied => stats.denied += 1,
            }
        }
        Ok(stats)
    }
}
