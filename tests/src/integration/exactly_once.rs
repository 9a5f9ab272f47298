//! # Exactly-Once Finalization
//!
//! N concurrent `try_finalize` calls on a ready record yield one
//! `Finalized`; every other call sees `LockHeld` or `AlreadyFinalized`.

#[cfg(test)]
mod tests {
    use crate::fixtures::{clock, file_runtime, insert_delivery, Fixture};
    use sd_01_artifact_store::ArtifactStore;
    use sd_02_document_composer::page_count;
    use sd_02_document_composer::test_utils::{sample_pdf, sample_signature_png};
    use sd_05_finalization::TryFinalizeOutcome;
    use shared_types::{ArtifactNamespace, ArtifactRef, DeliveryRecord, DeliveryStatus};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Tally {
        finalized: usize,
        lock_held: usize,
        already_finalized: usize,
        other: usize,
    }

    impl Tally {
        fn add(&mut self, outcome: &TryFinalizeOutcome) {
            match outcome {
                TryFinalizeOutcome::Finalized(_) => self.finalized += 1,
                TryFinalizeOutcome::LockHeld => self.lock_held += 1,
                TryFinalizeOutcome::AlreadyFinalized => self.already_finalized += 1,
                _ => self.other += 1,
            }
        }
    }

    async fn attach_both(runtime: &delivery_runtime::DeliveryRuntime, record: &DeliveryRecord) {
        let sig = ArtifactRef::signature(record.tenant_id, record.id, "png");
        let orig = ArtifactRef::original(record.tenant_id, record.id);
        runtime
            .artifacts
            .put(&sig, sample_signature_png(200, 80))
            .await
            .unwrap();
        runtime.artifacts.put(&orig, sample_pdf(3)).await.unwrap();
        runtime.repository.attach_signature(record.id, sig).await.unwrap();
        runtime.repository.attach_original(record.id, orig).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_triggers_finalize_once() {
        let f = Fixture::new();
        let record = f.delivery(Some("jane@example.com")).await;
        attach_both(&f.runtime, &record).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let coordinator = Arc::clone(&f.runtime.coordinator);
            let id = record.id;
            handles.push(tokio::spawn(async move { coordinator.try_finalize(id).await }));
        }
        let mut tally = Tally::default();
        for handle in handles {
            tally.add(&handle.await.unwrap());
        }

        assert_eq!(tally.finalized, 1, "{:?}", tally);
        assert_eq!(tally.other, 0, "{:?}", tally);
        assert_eq!(tally.lock_held + tally.already_finalized, 15);

        assert_eq!(f.artifacts.count(ArtifactNamespace::Final), 1);
        let stored = f.runtime.repository.load(record.id).await.unwrap();
        assert_eq!(stored.status, DeliveryStatus::Finalized);
        let final_pdf = f
            .runtime
            .artifacts
            .get(stored.final_doc_ref.as_ref().unwrap())
            .await
            .unwrap();
        assert_eq!(page_count(&final_pdf).unwrap(), 4);

        assert_eq!(f.runtime.tokens.tokens_for(record.id).await.unwrap().len(), 2);
        assert_eq!(f.audit.count(record.id, "finalization_started"), 1);
        assert_eq!(f.audit.count(record.id, "finalized"), 1);
        assert_eq!(f.audit.count(record.id, "finalization_failed"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_uploads_finalize_once() {
        for _ in 0..8 {
            let f = Fixture::new();
            let record = f.delivery(None).await;
            let id = record.id;
            let uploads = f.runtime.upload_handlers();

            let signature = {
                let uploads = uploads.clone();
                tokio::spawn(async move {
                    uploads
                        .signature_received(id, sample_signature_png(120, 50), "image/png")
                        .await
                })
            };
            let original = {
                let uploads = uploads.clone();
                tokio::spawn(async move {
                    uploads
                        .original_received(id, sample_pdf(2), "application/pdf")
                        .await
                })
            };

            let receipts = [
                signature.await.unwrap().unwrap(),
                original.await.unwrap().unwrap(),
            ];
            let finalized = receipts
                .iter()
                .filter(|r| r.finalization.is_finalized())
                .count();
            assert_eq!(finalized, 1);
            assert_eq!(f.artifacts.count(ArtifactNamespace::Final), 1);
            assert_eq!(f.runtime.tokens.tokens_for(record.id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_runtimes_sharing_storage_finalize_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();
        let first = file_runtime(dir.path(), clock.clone()).await;
        let second = file_runtime(dir.path(), clock.clone()).await;

        let record = insert_delivery(&first, None).await;
        attach_both(&first, &record).await;

        let mut handles = Vec::new();
        for i in 0..12 {
            let coordinator = if i % 2 == 0 {
                Arc::clone(&first.coordinator)
            } else {
                Arc::clone(&second.coordinator)
            };
            let id = record.id;
            handles.push(tokio::spawn(async move { coordinator.try_finalize(id).await }));
        }
        let mut tally = Tally::default();
        for handle in handles {
            tally.add(&handle.await.unwrap());
        }
        assert_eq!(tally.finalized, 1, "{:?}", tally);
        assert_eq!(tally.other, 0, "{:?}", tally);

        let finals: Vec<_> = std::fs::read_dir(
            dir.path()
                .join("artifacts/final")
                .join(record.tenant_id.to_string())
                .join(record.id.to_string()),
        )
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
        assert_eq!(finals.len(), 1);

        let seen_by_second = second.repository.load(record.id).await.unwrap();
        assert_eq!(seen_by_second.status, DeliveryStatus::Finalized);
        assert!(seen_by_second.finalizing_at.is_none());
    }
}
