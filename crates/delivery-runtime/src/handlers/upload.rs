//! # Artifact Upload Handlers
//!
//! The two independent paths that feed finalization:
//!
//! ```text
//! signer ──signature──→ signature_received ─┐
//!                                           ├──→ try_finalize
//! employee ──PDF──────→ original_received ──┘
//! ```
//!
//! Each handler stores its artifact, attaches the reference and then
//! triggers finalization. The upload succeeds as soon as the artifact is
//! attached: a `NotReady`, `LockHeld` or `Failed` finalization is reported
//! in the receipt but never turns into an error.

use super::record_audit;
use crate::container::DeliveryRuntime;
use crate::error::{HandlerError, HandlerResult};
use sd_01_artifact_store::ArtifactError;
use sd_02_document_composer::{integrity, SignatureFormat};
use sd_04_audit_log::AuditPayload;
use sd_05_finalization::{RepositoryError, TryFinalizeOutcome};
use shared_types::{ActorKind, ArtifactNamespace, ArtifactRef, DeliveryId, DeliveryRecord, DeliveryStatus};
use tracing::{debug, info, warn};

const PDF_MIME: &str = "application/pdf";

/// Result of an accepted upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub delivery_id: DeliveryId,
    pub status: DeliveryStatus,
    /// The artifact was already attached; nothing was stored.
    pub already_attached: bool,
    pub finalization: TryFinalizeOutcome,
}

impl UploadReceipt {
    pub fn finalized(&self) -> bool {
        matches!(
            self.finalization,
            TryFinalizeOutcome::Finalized(_) | TryFinalizeOutcome::AlreadyFinalized
        )
    }
}

/// Upload handlers for the signature and the original document.
#[derive(Clone)]
pub struct UploadHandlers {
    runtime: DeliveryRuntime,
}

impl UploadHandlers {
    pub fn new(runtime: DeliveryRuntime) -> Self {
        Self { runtime }
    }

    /// Signature image captured from the signer (PNG or JPEG).
    pub async fn signature_received(
        &self,
        id: DeliveryId,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> HandlerResult<UploadReceipt> {
        let record = self.accepting_record(id).await?;
        if record.signature_ref.is_some() {
            debug!(delivery_id = %id, "[runtime] Signature already attached");
            return Ok(self.receipt(record, true).await);
        }

        if !mime_type.starts_with("image/") {
            return Err(HandlerError::UnsupportedContentType {
                mime_type: mime_type.to_string(),
            });
        }
        check_size(&bytes, self.runtime.config.limits.max_signature_bytes)?;
        let format = SignatureFormat::detect(&bytes).ok_or_else(|| {
            HandlerError::UnsupportedContentType {
                mime_type: mime_type.to_string(),
            }
        })?;

        let size = bytes.len() as u64;
        let artifact = ArtifactRef::signature(record.tenant_id, id, format.extension());
        self.store(&artifact, bytes).await?;

        let record = match self.runtime.repository.attach_signature(id, artifact).await {
            Ok(record) => record,
            Err(e) => return self.attach_failed(id, e).await,
        };
        info!(delivery_id = %id, size, format = format.mime_type(), "[runtime] Signature attached");

        record_audit(
            &self.runtime,
            record.tenant_id,
            id,
            ActorKind::Client,
            AuditPayload::SignatureUploaded {
                size,
                mime_type: format.mime_type().to_string(),
            },
        )
        .await;

        Ok(self.receipt(record, false).await)
    }

    /// Original commercial document uploaded by an employee.
    pub async fn original_received(
        &self,
        id: DeliveryId,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> HandlerResult<UploadReceipt> {
        let record = self.accepting_record(id).await?;
        if record.original_doc_ref.is_some() {
            debug!(delivery_id = %id, "[runtime] Original already attached");
            return Ok(self.receipt(record, true).await);
        }

        if mime_type != PDF_MIME {
            return Err(HandlerError::UnsupportedContentType {
                mime_type: mime_type.to_string(),
            });
        }
        check_size(&bytes, self.runtime.config.limits.max_original_bytes)?;

        let size = bytes.len() as u64;
        let artifact = ArtifactRef::original(record.tenant_id, id);
        self.store(&artifact, bytes).await?;

        let record = match self.runtime.repository.attach_original(id, artifact).await {
            Ok(record) => record,
            Err(e) => return self.attach_failed(id, e).await,
        };
        info!(delivery_id = %id, size, "[runtime] Original document attached");

        record_audit(
            &self.runtime,
            record.tenant_id,
            id,
            ActorKind::Employee,
            AuditPayload::OriginalUploaded { size },
        )
        .await;

        Ok(self.receipt(record, false).await)
    }

    async fn accepting_record(&self, id: DeliveryId) -> HandlerResult<DeliveryRecord> {
        let record = match self.runtime.repository.load(id).await {
            Ok(record) => record,
            Err(RepositoryError::NotFound { .. }) => return Err(HandlerError::DeliveryNotFound { id }),
            Err(e) => return Err(e.into()),
        };
        if !record.status.accepts_artifacts() {
            return Err(HandlerError::NotAccepting {
                id,
                status: record.status,
            });
        }
        Ok(record)
    }

    /// Create-if-absent. A blob already at the canonical path is reused only
    /// when it holds exactly the uploaded bytes; anything else is a conflict.
    async fn store(&self, artifact: &ArtifactRef, bytes: Vec<u8>) -> HandlerResult<()> {
        let digest = integrity::sha256_hex(&bytes);
        match self.runtime.artifacts.put(artifact, bytes).await {
            Ok(()) => Ok(()),
            Err(ArtifactError::AlreadyExists { .. }) if artifact.namespace != ArtifactNamespace::Final => {
                let existing = self.runtime.artifacts.get(artifact).await?;
                if integrity::verify(&existing, &digest) {
                    debug!(artifact = %artifact, "[runtime] Identical artifact already stored, reusing");
                    Ok(())
                } else {
                    warn!(artifact = %artifact, "[runtime] Different artifact already stored at canonical path");
                    Err(HandlerError::ArtifactConflict {
                        artifact: artifact.to_string(),
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A concurrent upload attached first, or the record left an accepting
    /// state in between.
    async fn attach_failed(&self, id: DeliveryId, error: RepositoryError) -> HandlerResult<UploadReceipt> {
        match error {
            RepositoryError::ArtifactAlreadyAttached { .. } => {
                let record = self.runtime.repository.load(id).await?;
                Ok(self.receipt(record, true).await)
            }
            RepositoryError::InvalidState { status, .. } => {
                Err(HandlerError::NotAccepting { id, status })
            }
            RepositoryError::NotFound { .. } => Err(HandlerError::DeliveryNotFound { id }),
            e => Err(e.into()),
        }
    }

    async fn receipt(&self, record: DeliveryRecord, already_attached: bool) -> UploadReceipt {
        let finalization = self.runtime.coordinator.try_finalize(record.id).await;
        match &finalization {
            TryFinalizeOutcome::Failed(reason) => warn!(
                delivery_id = %record.id,
                reason = %reason,
                retriable = reason.is_retriable(),
                "[runtime] Upload accepted, finalization failed"
            ),
            outcome => debug!(delivery_id = %record.id, outcome = outcome.label(), "[runtime] Upload accepted"),
        }

        let status = match &finalization {
            TryFinalizeOutcome::Finalized(_) => DeliveryStatus::Finalized,
            _ => record.status,
        };
        UploadReceipt {
            delivery_id: record.id,
            status,
            already_attached,
            finalization,
        }
    }
}

fn check_size(bytes: &[u8], limit: usize) -> HandlerResult<()> {
    if bytes.is_empty() {
        return Err(HandlerError::EmptyPayload);
    }
    if bytes.len() > limit {
        return Err(HandlerError::PayloadTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}
