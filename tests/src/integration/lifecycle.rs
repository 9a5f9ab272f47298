//! # Finalization Lifecycle
//!
//! Readiness gate, idempotent re-entry, and lock release after a failed
//! attempt.

#[cfg(test)]
mod tests {
    use crate::fixtures::{clock, Fixture, BUSINESS, DOC_NUMBER, SIGNER};
    use chrono::Duration;
    use sd_01_artifact_store::{ArtifactStore, InMemoryArtifactStore};
    use sd_02_document_composer::test_utils::{sample_pdf, sample_signature_png};
    use sd_02_document_composer::{
        ComposeError, ComposeRequest, ComposeResult, ComposedDocument, DocumentComposer,
        PdfComposer,
    };
    use sd_03_access_tokens::{AccessTokenIssuer, InMemoryTokenStore};
    use sd_04_audit_log::InMemoryAuditLog;
    use sd_05_finalization::{
        DeliveryRepository, FailureReason, FinalizationConfig, FinalizationCoordinator,
        FinalizationPorts, InMemoryDeliveryRepository, RecordingNotifier, TryFinalizeOutcome,
    };
    use shared_types::{ArtifactRef, Clock, DeliveryRecord, DeliveryStatus, TenantId};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Fails while `broken` is set.
    #[derive(Default)]
    struct SwitchableComposer {
        broken: AtomicBool,
    }

    impl DocumentComposer for SwitchableComposer {
        fn compose(&self, request: &ComposeRequest) -> ComposeResult<ComposedDocument> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(ComposeError::Serialize {
                    reason: "disk full".to_string(),
                });
            }
            PdfComposer::new().compose(request)
        }
    }

    #[tokio::test]
    async fn test_readiness_gate_performs_no_writes() {
        let f = Fixture::new();
        let record = f.delivery(Some("jane@example.com")).await;

        assert_eq!(
            f.runtime.coordinator.try_finalize(record.id).await,
            TryFinalizeOutcome::NotReady
        );

        let receipt = f
            .runtime
            .upload_handlers()
            .signature_received(record.id, sample_signature_png(100, 40), "image/png")
            .await
            .unwrap();
        assert_eq!(receipt.finalization, TryFinalizeOutcome::NotReady);
        for _ in 0..3 {
            assert_eq!(
                f.runtime.coordinator.try_finalize(record.id).await,
                TryFinalizeOutcome::NotReady
            );
        }

        let stored = f.runtime.repository.load(record.id).await.unwrap();
        assert!(stored.finalizing_at.is_none());
        assert!(stored.final_doc_ref.is_none());
        assert!(f.runtime.tokens.tokens_for(record.id).await.unwrap().is_empty());
        assert_eq!(f.audit.count(record.id, "finalization_started"), 0);
        assert_eq!(f.audit.count(record.id, "finalization_failed"), 0);
        assert_eq!(f.audit.count(record.id, "signature_uploaded"), 1);
    }

    #[tokio::test]
    async fn test_reentry_after_finalized() {
        let f = Fixture::new();
        let record = f.finalized_delivery(Some("jane@example.com"), 3).await;
        assert_eq!(record.status, DeliveryStatus::Finalized);
        let final_ref = record.final_doc_ref.clone().unwrap();
        let final_bytes = f.runtime.artifacts.get(&final_ref).await.unwrap();

        for _ in 0..5 {
            assert_eq!(
                f.runtime.coordinator.try_finalize(record.id).await,
                TryFinalizeOutcome::AlreadyFinalized
            );
        }
        let sweep = f.runtime.sweeper().sweep_once().await;
        assert_eq!(sweep.pending, 0);

        assert_eq!(f.runtime.tokens.tokens_for(record.id).await.unwrap().len(), 2);
        assert_eq!(f.runtime.artifacts.get(&final_ref).await.unwrap(), final_bytes);
        assert_eq!(f.audit.count(record.id, "finalized"), 1);
        assert_eq!(f.runtime.repository.load(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_failed_composition_releases_lock_and_retry_succeeds() {
        let clock = clock();
        let repository = Arc::new(InMemoryDeliveryRepository::new());
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let composer = Arc::new(SwitchableComposer::default());
        let tokens = Arc::new(AccessTokenIssuer::new(
            Arc::new(InMemoryTokenStore::new()),
            clock.clone(),
        ));
        let coordinator = FinalizationCoordinator::new(
            FinalizationConfig::default(),
            FinalizationPorts {
                repository: repository.clone(),
                artifacts: artifacts.clone(),
                composer: composer.clone(),
                tokens: tokens.clone(),
                audit: audit.clone(),
                notifier: Arc::new(RecordingNotifier::new()),
                clock: clock.clone(),
            },
        );

        let record = DeliveryRecord::new(TenantId::new(), BUSINESS, SIGNER, clock.now())
            .with_doc_number(DOC_NUMBER);
        repository.insert(record.clone()).await.unwrap();
        let sig = ArtifactRef::signature(record.tenant_id, record.id, "png");
        let orig = ArtifactRef::original(record.tenant_id, record.id);
        artifacts.put(&sig, sample_signature_png(80, 30)).await.unwrap();
        artifacts.put(&orig, sample_pdf(3)).await.unwrap();
        repository.attach_signature(record.id, sig.clone()).await.unwrap();
        repository.attach_original(record.id, orig.clone()).await.unwrap();

        composer.broken.store(true, Ordering::SeqCst);
        let failed = coordinator.try_finalize(record.id).await;
        match &failed {
            TryFinalizeOutcome::Failed(reason @ FailureReason::Composition(_)) => {
                assert!(reason.is_retriable())
            }
            other => panic!("unexpected {:?}", other),
        }

        let after_failure = repository.load(record.id).await.unwrap();
        assert!(after_failure.finalizing_at.is_none());
        assert_eq!(after_failure.signature_ref, Some(sig));
        assert_eq!(after_failure.original_doc_ref, Some(orig));
        assert!(after_failure.final_doc_ref.is_none());
        assert!(tokens.tokens_for(record.id).await.unwrap().is_empty());
        let failures: Vec<_> = audit
            .events_for(record.id)
            .into_iter()
            .filter(|e| e.event_type() == "finalization_failed")
            .collect();
        assert_eq!(failures.len(), 1);

        composer.broken.store(false, Ordering::SeqCst);
        clock.advance(Duration::seconds(30));
        assert!(coordinator.try_finalize(record.id).await.is_finalized());
        assert_eq!(
            repository.load(record.id).await.unwrap().status,
            DeliveryStatus::Finalized
        );
    }

    #[tokio::test]
    async fn test_terminal_record_is_refused() {
        let f = Fixture::new();
        let mut record = DeliveryRecord::new(TenantId::new(), BUSINESS, SIGNER, f.clock.now());
        record.status = DeliveryStatus::Closed;
        record.signature_ref = Some(ArtifactRef::signature(record.tenant_id, record.id, "png"));
        record.original_doc_ref = Some(ArtifactRef::original(record.tenant_id, record.id));
        f.runtime.repository.insert(record.clone()).await.unwrap();

        match f.runtime.coordinator.try_finalize(record.id).await {
            TryFinalizeOutcome::Failed(reason) => {
                assert_eq!(reason, FailureReason::TerminalState(DeliveryStatus::Closed));
                assert!(!reason.is_retriable());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(f.runtime.repository.load(record.id).await.unwrap().finalizing_at.is_none());
        assert!(f.audit.events_for(record.id).is_empty());
    }
}
