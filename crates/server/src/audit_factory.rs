use std::sync::Arc;

use agegate_audit::{AuditSink, FanoutAuditSink};
use agegate_audit_memory::MemoryAuditSink;
use agegate_core::GateConfig;
use agegate_discord::ChannelAuditSink;
use agegate_guild::GuildActions;

/// Create the audit sink chain.
///
/// Events always land in the in-memory sink so they stay queryable in
/// development. When a guild backend is supplied, events are additionally
/// posted to the mod-log channel as embeds.
pub fn create_audit_sink(
    gate: &GateConfig,
    forward: Option<Arc<dyn GuildActions>>,
) -> Arc<dyn AuditSink> {
    let memory: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
    match forward {
        Some(guild) => {
            let channel = ChannelAuditSink::new(guild, gate.channels.mod_log.id.clone());
            Arc::new(FanoutAuditSink::new(vec![memory, Arc::new(channel)]))
        }
        None => memory,
    }
}
