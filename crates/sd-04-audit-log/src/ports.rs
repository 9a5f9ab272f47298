//! Port definition for the audit sink.

use crate::domain::AuditEvent;
use crate::error::AuditResult;
use async_trait::async_trait;

/// Append-only audit sink. There is no update or delete.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, event: AuditEvent) -> AuditResult<()>;
}
