use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use agegate_core::{RecordId, UserId, VerificationRecord};
use agegate_records::error::RecordError;
use agegate_records::verification::VerificationStore;

/// In-memory verification store using `DashMap`. Suitable for development
/// and tests.
///
/// Records are stored in a concurrent hash map keyed by record ID, with a
/// secondary index from user ID to record IDs.
pub struct MemoryVerificationStore {
    /// Primary store: record ID -> record.
    records: DashMap<RecordId, VerificationRecord>,
    /// Secondary index: user ID -> list of record IDs.
    user_index: DashMap<UserId, Vec<RecordId>>,
}

impl MemoryVerificationStore {
    /// Create a new empty in-memory verification store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            user_index: DashMap::new(),
        }
    }
}

impl Default for MemoryVerificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationStore for MemoryVerificationStore {
    async fn add(&self, record: &VerificationRecord) -> Result<(), RecordError> {
        self.records.insert(record.id.clone(), record.clone());
        self.user_index
            .entry(record.user.clone())
            .or_default()
            .push(record.id.clone());
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, RecordError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn pending(&self) -> Result<Vec<VerificationRecord>, RecordError> {
        let mut pending: Vec<VerificationRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().is_pending())
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(pending)
    }

    async fn latest_unreviewed_for_user(
        &self,
        user: &UserId,
    ) -> Result<Option<VerificationRecord>, RecordError> {
        let ids = self.user_index.get(user);
        let Some(ids) = ids else {
            return Ok(None);
        };

        let mut latest: Option<VerificationRecord> = None;
        for id in ids.value() {
            if let Some(rec) = self.records.get(id) {
                let rec = rec.value();
                if !rec.is_pending() {
                    continue;
                }
                if latest
                    .as_ref()
                    .is_none_or(|best| rec.submitted_at > best.submitted_at)
                {
                    latest = Some(rec.clone());
                }
            }
        }
        Ok(latest)
    }

    async fn for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, RecordError> {
        let ids = self.user_index.get(user);
        let Some(ids) = ids else {
            return Ok(Vec::new());
        };

        let mut history: Vec<VerificationRecord> = ids
            .value()
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| r.value().clone()))
            .collect();
        history.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(history)
    }

    async fn update_review(
        &self,
        id: &RecordId,
        reviewer: &UserId,
        verified: bool,
        notes: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool, RecordError> {
        // The shard guard from get_mut serializes racing reviewers.
        let Some(mut record) = self.records.get_mut(id) else {
            return Err(RecordError::NotFound(id.to_string()));
        };
        if record.reviewed {
            return Ok(false);
        }
        record.reviewed = true;
        record.verified = verified;
        record.reviewer = Some(reviewer.clone());
        record.reviewed_at = Some(reviewed_at);
        record.notes = notes.map(ToOwned::to_owned);
        Ok(true)
    }

    async fn purge_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RecordError> {
        // Collect IDs to remove (cannot mutate while iterating DashMap).
        let stale_ids: Vec<RecordId> = self
            .records
            .iter()
            .filter_map(|entry| {
                let rec = entry.value();
                match rec.reviewed_at {
                    Some(reviewed_at) if rec.reviewed && reviewed_at < cutoff => {
                        Some(rec.id.clone())
                    }
                    _ => None,
                }
            })
            .collect();

        let mut removed = 0u64;
        for id in stale_ids {
            if let Some((_, rec)) = self.records.remove(&id) {
                if let Some(mut ids) = self.user_index.get_mut(&rec.user) {
                    ids.retain(|i| i != &id);
                }
                removed += 1;
            }
        }
        Ok(removed)
    }
}
