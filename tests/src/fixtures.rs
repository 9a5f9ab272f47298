//! Shared builders for integration tests.

use chrono::{TimeZone, Utc};
use delivery_runtime::{ContainerParts, DeliveryRuntime, RuntimeConfig};
use sd_01_artifact_store::{FileSystemArtifactStore, InMemoryArtifactStore};
use sd_02_document_composer::test_utils::{sample_pdf, sample_signature_png};
use sd_03_access_tokens::{AccessTokenIssuer, InMemoryTokenStore, JsonFileTokenStore};
use sd_04_audit_log::{InMemoryAuditLog, JsonLinesAuditLog};
use sd_05_finalization::{FileDeliveryRepository, InMemoryDeliveryRepository, RecordingNotifier};
use shared_types::{Clock, DeliveryRecord, ManualClock, TenantId};
use std::path::Path;
use std::sync::Arc;

pub const DOC_NUMBER: &str = "ALB-2026-001";
pub const BUSINESS: &str = "Acme Supplies";
pub const SIGNER: &str = "Jane Roe";

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap(),
    ))
}

/// In-memory runtime with handles on the concrete adapters.
pub struct Fixture {
    pub runtime: DeliveryRuntime,
    pub clock: Arc<ManualClock>,
    pub artifacts: Arc<InMemoryArtifactStore>,
    pub audit: Arc<InMemoryAuditLog>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let clock = clock();
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let parts = ContainerParts {
            repository: Arc::new(InMemoryDeliveryRepository::new()),
            artifacts: artifacts.clone(),
            tokens: Arc::new(AccessTokenIssuer::new(
                Arc::new(InMemoryTokenStore::new()),
                clock.clone(),
            )),
            audit: audit.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };
        Self {
            runtime: DeliveryRuntime::from_parts(config, parts),
            clock,
            artifacts,
            audit,
            notifier,
        }
    }

    /// Insert a fresh record.
    pub async fn delivery(&self, email: Option<&str>) -> DeliveryRecord {
        insert_delivery(&self.runtime, email).await
    }

    /// Insert a record and upload both artifacts through the handlers.
    pub async fn finalized_delivery(&self, email: Option<&str>, pages: usize) -> DeliveryRecord {
        let record = self.delivery(email).await;
        let uploads = self.runtime.upload_handlers();
        uploads
            .original_received(record.id, sample_pdf(pages), "application/pdf")
            .await
            .unwrap();
        uploads
            .signature_received(record.id, sample_signature_png(240, 90), "image/png")
            .await
            .unwrap();
        self.runtime.repository.load(record.id).await.unwrap()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn insert_delivery(runtime: &DeliveryRuntime, email: Option<&str>) -> DeliveryRecord {
    let mut record = DeliveryRecord::new(TenantId::new(), BUSINESS, SIGNER, runtime.clock.now())
        .with_doc_number(DOC_NUMBER);
    if let Some(email) = email {
        record = record.with_signer_email(email);
    }
    runtime.repository.insert(record.clone()).await.unwrap();
    record
}

/// File-backed runtime rooted at `dir`. Several runtimes over the same
/// directory behave like separate processes sharing storage.
pub async fn file_runtime(dir: &Path, clock: Arc<ManualClock>) -> DeliveryRuntime {
    let parts = ContainerParts {
        repository: Arc::new(FileDeliveryRepository::open(dir.join("records")).unwrap()),
        artifacts: Arc::new(FileSystemArtifactStore::new(dir.join("artifacts"))),
        tokens: Arc::new(AccessTokenIssuer::new(
            Arc::new(JsonFileTokenStore::open(dir.join("tokens.json")).await.unwrap()),
            clock.clone(),
        )),
        audit: Arc::new(JsonLinesAuditLog::new(dir.join("audit.jsonl"))),
        notifier: Arc::new(RecordingNotifier::new()),
        clock,
    };
    let config = RuntimeConfig {
        data_dir: dir.to_path_buf(),
        ..RuntimeConfig::default()
    };
    DeliveryRuntime::from_parts(config, parts)
}
