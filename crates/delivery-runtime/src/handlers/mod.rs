//! # Handlers
//!
//! Transport-agnostic request handlers. An HTTP layer maps their inputs
//! from requests and their errors through [`HandlerError::status_code`].
//!
//! [`HandlerError::status_code`]: crate::error::HandlerError::status_code

pub mod download;
pub mod upload;

pub use download::{DeliverySummary, DownloadHandlers, DownloadResponse};
pub use upload::{UploadHandlers, UploadReceipt};

use crate::container::DeliveryRuntime;
use sd_04_audit_log::{AuditEvent, AuditPayload};
use shared_types::{ActorKind, DeliveryId, TenantId};
use tracing::warn;

/// Append an audit event. Failures are logged and never fail the request.
async fn record_audit(
    runtime: &DeliveryRuntime,
    tenant_id: TenantId,
    delivery_id: DeliveryId,
    actor: ActorKind,
    payload: AuditPayload,
) {
    let event = AuditEvent::new(tenant_id, delivery_id, actor, payload, runtime.clock.now());
    let event_type = event.event_type();
    if let Err(e) = runtime.audit.append(event).await {
        warn!(
            delivery_id = %delivery_id,
            event_type,
            error = %e,
            "[runtime] Audit append failed"
        );
    }
}
