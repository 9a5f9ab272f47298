//! Audit event model.
//!
//! Each event type carries its own payload shape; there is no open-ended
//! metadata map.

use serde::{Deserialize, Serialize};
use shared_types::{ActorKind, ArtifactRef, DeliveryId, TenantId, Timestamp};
use uuid::Uuid;

/// Typed payload, one variant per event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditPayload {
    /// Lock acquired, composition starting.
    FinalizationStarted,
    Finalized {
        original_hash: String,
        final_size: u64,
        final_ref: ArtifactRef,
    },
    FinalizationFailed {
        error: String,
    },
    SignatureUploaded {
        size: u64,
        mime_type: String,
    },
    OriginalUploaded {
        size: u64,
    },
    /// `token_kind` is `pickup` or `email`.
    DocumentDownloaded {
        token_kind: String,
    },
    TokenRevoked {
        token_kind: String,
    },
    /// Issuing a token failed after the record was finalized.
    TokenIssuanceFailed {
        token_kind: String,
        error: String,
    },
}

impl AuditPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditPayload::FinalizationStarted => "finalization_started",
            AuditPayload::Finalized { .. } => "finalized",
            AuditPayload::FinalizationFailed { .. } => "finalization_failed",
            AuditPayload::SignatureUploaded { .. } => "signature_uploaded",
            AuditPayload::OriginalUploaded { .. } => "original_uploaded",
            AuditPayload::DocumentDownloaded { .. } => "document_downloaded",
            AuditPayload::TokenRevoked { .. } => "token_revoked",
            AuditPayload::TokenIssuanceFailed { .. } => "token_issuance_failed",
        }
    }
}

/// An immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub delivery_id: DeliveryId,
    pub actor: ActorKind,
    pub payload: AuditPayload,
    pub recorded_at: Timestamp,
}

impl AuditEvent {
    pub fn new(
        tenant_id: TenantId,
        delivery_id: DeliveryId,
        actor: ActorKind,
        payload: AuditPayload,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            delivery_id,
            actor,
            payload,
            recorded_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
