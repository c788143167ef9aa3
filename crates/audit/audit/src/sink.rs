use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditError;
use crate::event::AuditEvent;

/// Trait for audit event sinks.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
/// Sinks receive every pipeline transition; storage-backed sinks keep them
/// queryable, forwarding sinks relay them elsewhere.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Short backend name for logging.
    fn name(&self) -> &str;
}

/// Fans every event out to several sinks.
///
/// All sinks receive the event even when an earlier one fails; the first
/// error is returned after the fan-out completes.
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AuditSink for FanoutAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.record(event.clone()).await {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "fanout"
    }
}
