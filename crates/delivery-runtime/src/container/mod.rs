//! # Delivery Container
//!
//! Holds the adapter instances and the finalization coordinator.
//!
//! ## Storage Layout (file-backed)
//!
//! ```text
//! {data_dir}/
//!   records/{delivery}.json      DeliveryRecord, fs2-locked updates
//!   artifacts/{namespace}/...    signature, original and final blobs
//!   tokens.json                  access tokens
//!   audit.jsonl                  append-only audit trail
//! ```

pub mod config;

pub use config::{ConfigError, RuntimeConfig, UploadLimits};

use crate::handlers::{DownloadHandlers, UploadHandlers};
use crate::sweeper::RetrySweeper;
use sd_01_artifact_store::{ArtifactStore, FileSystemArtifactStore, InMemoryArtifactStore};
use sd_02_document_composer::PdfComposer;
use sd_03_access_tokens::{
    AccessTokenIssuer, InMemoryTokenStore, JsonFileTokenStore, TokenError,
};
use sd_04_audit_log::{AuditLog, InMemoryAuditLog, JsonLinesAuditLog};
use sd_05_finalization::{
    DeliveryNotifier, DeliveryRepository, FileDeliveryRepository, FinalizationCoordinator,
    FinalizationPorts, InMemoryDeliveryRepository, RepositoryError, TracingNotifier,
};
use shared_types::{Clock, SystemClock};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Container construction errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open delivery records: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Failed to open token store: {0}")]
    Tokens(#[from] TokenError),
}

/// Adapters to wire into a container. Tests swap individual pieces.
pub struct ContainerParts {
    pub repository: Arc<dyn DeliveryRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub tokens: Arc<AccessTokenIssuer>,
    pub audit: Arc<dyn AuditLog>,
    pub notifier: Arc<dyn DeliveryNotifier>,
    pub clock: Arc<dyn Clock>,
}

impl ContainerParts {
    /// Single-process adapters with no persistence.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            repository: Arc::new(InMemoryDeliveryRepository::new()),
            artifacts: Arc::new(InMemoryArtifactStore::new()),
            tokens: Arc::new(AccessTokenIssuer::new(
                Arc::new(InMemoryTokenStore::new()),
                Arc::clone(&clock),
            )),
            audit: Arc::new(InMemoryAuditLog::new()),
            notifier: Arc::new(TracingNotifier),
            clock,
        }
    }
}

/// Central container shared by the handlers and the sweeper.
#[derive(Clone)]
pub struct DeliveryRuntime {
    pub config: RuntimeConfig,
    pub repository: Arc<dyn DeliveryRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub tokens: Arc<AccessTokenIssuer>,
    pub audit: Arc<dyn AuditLog>,
    pub clock: Arc<dyn Clock>,
    pub coordinator: Arc<FinalizationCoordinator>,
}

impl DeliveryRuntime {
    /// Open file-backed adapters under `config.data_dir`.
    #[instrument(name = "runtime_init", skip(config), fields(data_dir = %config.data_dir.display()))]
    pub async fn open(config: RuntimeConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let root = config.data_dir.clone();

        let repository = FileDeliveryRepository::open(root.join("records"))?;
        info!("  [sd-05] Delivery records at {}", repository.root().display());

        let artifacts = FileSystemArtifactStore::new(root.join("artifacts"));
        info!("  [sd-01] Artifacts at {}", artifacts.root().display());

        let token_store = JsonFileTokenStore::open(root.join("tokens.json")).await?;
        info!("  [sd-03] Access tokens at {}", token_store.path().display());

        let audit = JsonLinesAuditLog::new(root.join("audit.jsonl"));
        info!("  [sd-04] Audit log at {}", audit.path().display());

        let parts = ContainerParts {
            repository: Arc::new(repository),
            artifacts: Arc::new(artifacts),
            tokens: Arc::new(AccessTokenIssuer::new(
                Arc::new(token_store),
                Arc::clone(&clock),
            )),
            audit: Arc::new(audit),
            notifier: Arc::new(TracingNotifier),
            clock,
        };
        Ok(Self::from_parts(config, parts))
    }

    /// In-memory container.
    pub fn in_memory(config: RuntimeConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(config, ContainerParts::in_memory(clock))
    }

    pub fn from_parts(config: RuntimeConfig, parts: ContainerParts) -> Self {
        let coordinator = FinalizationCoordinator::new(
            config.finalization.clone(),
            FinalizationPorts {
                repository: Arc::clone(&parts.repository),
                artifacts: Arc::clone(&parts.artifacts),
                composer: Arc::new(PdfComposer::new()),
                tokens: Arc::clone(&parts.tokens),
                audit: Arc::clone(&parts.audit),
                notifier: parts.notifier,
                clock: Arc::clone(&parts.clock),
            },
        );

        Self {
            config,
            repository: parts.repository,
            artifacts: parts.artifacts,
            tokens: parts.tokens,
            audit: parts.audit,
            clock: parts.clock,
            coordinator: Arc::new(coordinator),
        }
    }

    pub fn upload_handlers(&self) -> UploadHandlers {
        UploadHandlers::new(self.clone())
    }

    pub fn download_handlers(&self) -> DownloadHandlers {
        DownloadHandlers::new(self.clone())
    }

    pub fn sweeper(&self) -> RetrySweeper {
        RetrySweeper::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.coordinator),
            Arc::clone(&self.clock),
            self.config.sweep_interval,
        )
    }
}
