use async_trait::async_trait;
use dashmap::DashMap;

use agegate_audit::error::AuditError;
use agegate_audit::event::{AuditEvent, AuditPage, AuditQuery};
use agegate_audit::sink::AuditSink;

/// In-memory audit sink using `DashMap`. Suitable for development and tests.
///
/// Events are stored in a concurrent hash map keyed by event ID, with a
/// secondary index from event kind to event IDs. Unbounded; long-running
/// deployments that need an audit trail should forward to a durable sink.
pub struct MemoryAuditSink {
    /// Primary store: event ID -> event.
    events: DashMap<String, AuditEvent>,
    /// Secondary index: event kind -> list of event IDs.
    kind_index: DashMap<&'static str, Vec<String>>,
}

impl MemoryAuditSink {
    /// Create a new empty in-memory audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            kind_index: DashMap::new(),
        }
    }

    /// Retrieve an event by its unique ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<AuditEvent> {
        self.events.get(id).map(|e| e.value().clone())
    }

    /// Query recorded events with filters and pagination, newest first.
    #[must_use]
    pub fn query(&self, query: &AuditQuery) -> AuditPage {
        let limit = query.effective_limit();
        let offset = query.effective_offset();

        // Walk the kind index when a kind filter is set, the full map
        // otherwise.
        let mut matching: Vec<AuditEvent> = match query.kind {
            Some(kind) => self
                .kind_index
                .get(kind.as_str())
                .map(|ids| {
                    ids.value()
                        .iter()
                        .filter_map(|id| self.events.get(id).map(|e| e.value().clone()))
                        .collect()
                })
                .unwrap_or_default(),
            None => self.events.iter().map(|e| e.value().clone()).collect(),
        };
        matching.retain(|event| matches_query(query, event));

        // Sort by creation time descending.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let events: Vec<AuditEvent> = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        AuditPage {
            events,
            total,
            limit,
            offset,
        }
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let id = event.id.clone();
        let kind = event.kind.as_str();
        self.events.insert(id.clone(), event);
        self.kind_index.entry(kind).or_default().push(id);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn matches_query(query: &AuditQuery, event: &AuditEvent) -> bool {
    if let Some(ref subject) = query.subject {
        if event.subject.as_ref() != Some(subject) {
            return false;
        }
    }
    if query.urgent_only && !event.urgent {
        return false;
    }
    if let Some(ref from) = query.from {
        if event.created_at < *from {
            return false;
        }
    }
    if let Some(ref to) = query.to {
        if event.created_at > *to {
            return false;
        }
    }
    true
}
