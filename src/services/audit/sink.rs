use tracing::{info, warn};

use super::record::AuditRecord;

/// Where finished audit records go. Implementations must not fail the caller.
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: &AuditRecord);
}

/// Writes each record as one structured log line on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn emit(&self, record: &AuditRecord) {
        match serde_json::to_string(record) {
            Ok(json) => info!(target: "audit", audit = %json, "Audit Event Recorded"),
            Err(err) => warn!(
                target: "audit",
                error = %err,
                method = %record.method,
                "audit record could not be serialized"
            ),
        }
    }
}
