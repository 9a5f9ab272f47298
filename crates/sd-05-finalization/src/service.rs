//! Finalization Coordinator - core business logic
//!
//! ```text
//! load ──finalized?──→ AlreadyFinalized
//!   │ ──terminal?───→ Failed(terminal_state)
//!   │ ──missing?────→ NotReady
//!   ▼
//! CAS finalizing_at ──held──→ LockHeld
//!   │ acquired
//!   ▼
//! get artifacts → compose → put final → commit FINALIZED → tokens, audit, notify
//!   │ any error
//!   ▼
//! release lock (token-conditioned) → audit failure → Failed(reason)
//! ```

use crate::domain::{
    FailureReason, FinalizationCommit, FinalizationConfig, FinalizationReport, LockAttempt,
    TryFinalizeOutcome,
};
use crate::error::{FinalizationResult, RepositoryError};
use crate::ports::{
    DeliveryNotifier, DeliveryRepository, FinalizationApi, FinalizationNotice,
};
use async_trait::async_trait;
use delivery_telemetry::{delivery_span, FINALIZE_OUTCOMES};
use sd_01_artifact_store::{ArtifactError, ArtifactStore};
use sd_02_document_composer::{
    page_count, CertificationMetadata, ComposeRequest, DocumentComposer,
};
use sd_03_access_tokens::{AccessToken, AccessTokenIssuer, TokenKind};
use sd_04_audit_log::{AuditEvent, AuditLog, AuditPayload};
use shared_types::{ActorKind, ArtifactRef, Clock, DeliveryId, DeliveryRecord, Timestamp};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Collaborators of the coordinator.
#[derive(Clone)]
pub struct FinalizationPorts {
    pub repository: Arc<dyn DeliveryRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub composer: Arc<dyn DocumentComposer>,
    pub tokens: Arc<AccessTokenIssuer>,
    pub audit: Arc<dyn AuditLog>,
    pub notifier: Arc<dyn DeliveryNotifier>,
    pub clock: Arc<dyn Clock>,
}

/// A composed document, stored and committed.
struct Committed {
    record: DeliveryRecord,
    final_size: u64,
}

/// Orchestrates readiness, the persistent lock, composition and
/// persistence of the final document.
pub struct FinalizationCoordinator {
    config: FinalizationConfig,
    ports: FinalizationPorts,
}

impl FinalizationCoordinator {
    pub fn new(config: FinalizationConfig, ports: FinalizationPorts) -> Self {
        Self { config, ports }
    }

    pub fn config(&self) -> &FinalizationConfig {
        &self.config
    }

    /// Attempt to finalize `id`. Never panics and never returns an error:
    /// every failure is folded into [`TryFinalizeOutcome::Failed`].
    pub async fn try_finalize(&self, id: DeliveryId) -> TryFinalizeOutcome {
        let outcome = self
            .run(id)
            .instrument(delivery_span!("try_finalize", delivery_id = %id.short()))
            .await;
        FINALIZE_OUTCOMES.with_label_values(&[outcome.label()]).inc();
        outcome
    }

    async fn run(&self, id: DeliveryId) -> TryFinalizeOutcome {
        let record = match self.ports.repository.load(id).await {
            Ok(record) => record,
            Err(RepositoryError::NotFound { .. }) => {
                return TryFinalizeOutcome::Failed(FailureReason::NotFound)
            }
            Err(e) => return TryFinalizeOutcome::Failed(FailureReason::Persistence(e.to_string())),
        };

        if record.is_finalized() {
            debug!(delivery_id = %id, "[sd-05] Already finalized");
            return TryFinalizeOutcome::AlreadyFinalized;
        }
        if record.status.is_terminal() {
            warn!(delivery_id = %id, status = %record.status, "[sd-05] Finalization refused: terminal state");
            return TryFinalizeOutcome::Failed(FailureReason::TerminalState(record.status));
        }
        if !record.has_all_artifacts() {
            debug!(
                delivery_id = %id,
                has_signature = record.signature_ref.is_some(),
                has_original = record.original_doc_ref.is_some(),
                "[sd-05] Not ready"
            );
            return TryFinalizeOutcome::NotReady;
        }

        let now = self.ports.clock.now();
        let stale_before = self.config.lock_ttl.map(|ttl| now - ttl);
        let attempt = self
            .ports
            .repository
            .try_acquire_lock(id, now, stale_before)
            .await;

        let (record, lock_token) = match attempt {
            Ok(LockAttempt::Acquired {
                record,
                lock_token,
                displaced,
            }) => {
                if let Some(since) = displaced {
                    warn!(
                        delivery_id = %id,
                        locked_since = %since,
                        "[sd-05] Took over abandoned finalization lock"
                    );
                }
                (record, lock_token)
            }
            Ok(LockAttempt::Held { since }) => {
                debug!(delivery_id = %id, locked_since = %since, "[sd-05] Lock held by another attempt");
                return TryFinalizeOutcome::LockHeld;
            }
            Ok(LockAttempt::AlreadyFinalized) => return TryFinalizeOutcome::AlreadyFinalized,
            Ok(LockAttempt::NotReady) => return TryFinalizeOutcome::NotReady,
            Ok(LockAttempt::Terminal(status)) => {
                return TryFinalizeOutcome::Failed(FailureReason::TerminalState(status))
            }
            Err(RepositoryError::NotFound { .. }) => {
                return TryFinalizeOutcome::Failed(FailureReason::NotFound)
            }
            Err(e) => return TryFinalizeOutcome::Failed(FailureReason::Persistence(e.to_string())),
        };

        info!(delivery_id = %id, "[sd-05] Finalization lock acquired");
        self.audit(&record, AuditPayload::FinalizationStarted).await;

        match self.compose_and_commit(&record, lock_token).await {
            Ok(committed) => self.on_success(committed).await,
            Err(reason) => self.on_failure(&record, lock_token, reason).await,
        }
    }

    async fn compose_and_commit(
        &self,
        record: &DeliveryRecord,
        lock_token: Timestamp,
    ) -> Result<Committed, FailureReason> {
        let signature_ref = record
            .signature_ref
            .as_ref()
            .ok_or_else(|| FailureReason::Artifact("signature not attached".to_string()))?;
        let original_ref = record
            .original_doc_ref
            .as_ref()
            .ok_or_else(|| FailureReason::Artifact("original not attached".to_string()))?;

        let signature_image = self.fetch(signature_ref).await?;
        let original_pdf = self.fetch(original_ref).await?;

        let now = self.ports.clock.now();
        let request = ComposeRequest {
            original_pdf,
            signature_image,
            metadata: CertificationMetadata {
                business_name: record.business_name.clone(),
                doc_number: record.doc_number.clone(),
                signer_name: record.signer_name.clone(),
                delivery_id: record.id,
                signed_at: now,
                generated_at: now,
            },
        };

        let composer = Arc::clone(&self.ports.composer);
        let composed = tokio::task::spawn_blocking(move || composer.compose(&request))
            .await
            .map_err(|e| FailureReason::Composition(e.to_string()))?
            .map_err(|e| FailureReason::Composition(e.to_string()))?;

        let final_ref = ArtifactRef::final_document(record.tenant_id, record.id);
        let composed_size = composed.bytes.len() as u64;
        let final_size = match self.ports.artifacts.put(&final_ref, composed.bytes).await {
            Ok(()) => composed_size,
            Err(ArtifactError::AlreadyExists { .. }) => {
                self.adopt_existing_final(&final_ref, composed.original_pages)
                    .await?
            }
            Err(e) => return Err(FailureReason::Artifact(e.to_string())),
        };

        let commit = FinalizationCommit {
            final_doc_ref: final_ref,
            original_hash: composed.original_hash,
            finalized_at: self.ports.clock.now(),
        };
        let record = self
            .ports
            .repository
            .complete_finalization(record.id, lock_token, commit)
            .await
            .map_err(|e| FailureReason::Persistence(e.to_string()))?;

        Ok(Committed { record, final_size })
    }

    async fn fetch(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, FailureReason> {
        self.ports
            .artifacts
            .get(artifact)
            .await
            .map_err(|e| FailureReason::Artifact(e.to_string()))
    }

    /// A final artifact without a committed record is left over from an
    /// attempt that stored it and then lost its lock or crashed. The store
    /// never overwrites, so keep it if it is a complete composition of the
    /// same original.
    async fn adopt_existing_final(
        &self,
        final_ref: &ArtifactRef,
        original_pages: usize,
    ) -> Result<u64, FailureReason> {
        let existing = self.fetch(final_ref).await?;
        match page_count(&existing) {
            Ok(pages) if pages == original_pages + 1 => {
                warn!(artifact = %final_ref, "[sd-05] Reusing final artifact from an interrupted attempt");
                Ok(existing.len() as u64)
            }
            Ok(pages) => Err(FailureReason::Artifact(format!(
                "existing final artifact has {} pages, expected {}",
                pages,
                original_pages + 1
            ))),
            Err(e) => Err(FailureReason::Artifact(format!(
                "existing final artifact unreadable: {}",
                e
            ))),
        }
    }

    async fn on_success(&self, committed: Committed) -> TryFinalizeOutcome {
        let Committed { record, final_size } = committed;
        let (final_ref, original_hash, finalized_at) = match (
            record.final_doc_ref.clone(),
            record.original_hash.clone(),
            record.finalized_at,
        ) {
            (Some(r), Some(h), Some(at)) => (r, h, at),
            _ => {
                return TryFinalizeOutcome::Failed(FailureReason::Persistence(
                    "committed record is missing final fields".to_string(),
                ))
            }
        };

        let pickup_token = self
            .issue(&record, TokenKind::Pickup, self.config.pickup_token_ttl)
            .await;
        let recipient = email_recipient(&record);
        let email_token = match recipient {
            Some(_) => {
                self.issue(&record, TokenKind::Email, self.config.email_token_ttl)
                    .await
            }
            None => None,
        };

        self.audit(
            &record,
            AuditPayload::Finalized {
                original_hash: original_hash.clone(),
                final_size,
                final_ref: final_ref.clone(),
            },
        )
        .await;

        if let (Some(recipient), Some(token)) = (recipient, &email_token) {
            self.notify(self.notice(&record, recipient, token));
        }

        info!(
            delivery_id = %record.id,
            final_ref = %final_ref,
            original_hash = %original_hash,
            final_size,
            "[sd-05] Delivery finalized"
        );

        TryFinalizeOutcome::Finalized(FinalizationReport {
            final_ref,
            original_hash,
            final_size,
            finalized_at,
            pickup_token,
            email_token,
        })
    }

    async fn on_failure(
        &self,
        record: &DeliveryRecord,
        lock_token: Timestamp,
        reason: FailureReason,
    ) -> TryFinalizeOutcome {
        match self
            .ports
            .repository
            .release_lock(record.id, lock_token)
            .await
        {
            Ok(true) => debug!(delivery_id = %record.id, "[sd-05] Finalization lock released"),
            Ok(false) => warn!(
                delivery_id = %record.id,
                "[sd-05] Lock was taken over before release"
            ),
            Err(e) => error!(
                delivery_id = %record.id,
                error = %e,
                "[sd-05] Failed to release finalization lock"
            ),
        }

        self.audit(
            record,
            AuditPayload::FinalizationFailed {
                error: reason.to_string(),
            },
        )
        .await;

        warn!(delivery_id = %record.id, reason = %reason, "[sd-05] Finalization failed");
        TryFinalizeOutcome::Failed(reason)
    }

    /// Issue the tokens a finalized record should carry but does not.
    ///
    /// A kind counts as present once any token of it was issued, revoked
    /// or expired ones included. Records that are not finalized are left
    /// alone.
    pub async fn reissue_missing_tokens(&self, id: DeliveryId) -> FinalizationResult<Vec<AccessToken>> {
        let record = self.ports.repository.load(id).await?;
        if !record.is_finalized() {
            return Ok(Vec::new());
        }

        let existing = self.ports.tokens.tokens_for(id).await?;
        let has = |kind: TokenKind| existing.iter().any(|t| t.kind == kind);
        let mut issued = Vec::new();

        if !has(TokenKind::Pickup) {
            let token = self
                .ports
                .tokens
                .issue(record.id, record.tenant_id, TokenKind::Pickup, self.config.pickup_token_ttl)
                .await?;
            issued.push(token);
        }

        if let Some(recipient) = email_recipient(&record) {
            if !has(TokenKind::Email) {
                let token = self
                    .ports
                    .tokens
                    .issue(record.id, record.tenant_id, TokenKind::Email, self.config.email_token_ttl)
                    .await?;
                self.notify(self.notice(&record, recipient, &token));
                issued.push(token);
            }
        }

        if !issued.is_empty() {
            info!(delivery_id = %id, count = issued.len(), "[sd-05] Missing access tokens reissued");
        }
        Ok(issued)
    }

    async fn issue(
        &self,
        record: &DeliveryRecord,
        kind: TokenKind,
        ttl: chrono::Duration,
    ) -> Option<AccessToken> {
        match self
            .ports
            .tokens
            .issue(record.id, record.tenant_id, kind, ttl)
            .await
        {
            Ok(token) => Some(token),
            Err(e) => {
                error!(
                    delivery_id = %record.id,
                    kind = %kind,
                    error = %e,
                    "[sd-05] Token issuance failed after finalization"
                );
                self.audit(
                    record,
                    AuditPayload::TokenIssuanceFailed {
                        token_kind: kind.as_str().to_string(),
                        error: e.to_string(),
                    },
                )
                .await;
                None
            }
        }
    }

    fn notice(&self, record: &DeliveryRecord, recipient: String, token: &AccessToken) -> FinalizationNotice {
        FinalizationNotice {
            delivery_id: record.id,
            tenant_id: record.tenant_id,
            doc_number: record.doc_number.clone(),
            business_name: record.business_name.clone(),
            signer_name: record.signer_name.clone(),
            recipient,
            download_url: self.config.download_url(&token.token),
            expires_at: token.expires_at,
        }
    }

    async fn audit(&self, record: &DeliveryRecord, payload: AuditPayload) {
        let event = AuditEvent::new(
            record.tenant_id,
            record.id,
            ActorKind::System,
            payload,
            self.ports.clock.now(),
        );
        let event_type = event.event_type();
        if let Err(e) = self.ports.audit.append(event).await {
            warn!(
                delivery_id = %record.id,
                event_type,
                error = %e,
                "[sd-05] Audit append failed"
            );
        }
    }

    /// Fire-and-forget: the outcome never affects finalization.
    fn notify(&self, notice: FinalizationNotice) {
        let notifier = Arc::clone(&self.ports.notifier);
        tokio::spawn(async move {
            let delivery_id = notice.delivery_id;
            if let Err(e) = notifier.delivery_finalized(notice).await {
                warn!(delivery_id = %delivery_id, error = %e, "[sd-05] Delivery notification failed");
            }
        });
    }
}

/// Trimmed signer email, if any.
fn email_recipient(record: &DeliveryRecord) -> Option<String> {
    record
        .signer_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl FinalizationApi for FinalizationCoordinator {
    async fn try_finalize(&self, id: DeliveryId) -> TryFinalizeOutcome {
        FinalizationCoordinator::try_finalize(self, id).await
    }
}
