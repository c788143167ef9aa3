pub mod error;
pub mod event;
pub mod sink;

pub use error::AuditError;
pub use event::{AuditActor, AuditEvent, AuditKind, AuditPage, AuditQuery};
pub use sink::{AuditSink, FanoutAuditSink};
