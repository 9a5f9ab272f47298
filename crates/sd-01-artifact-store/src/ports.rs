//! # Artifact Store Port
//!
//! Production: `FileSystemArtifactStore` (or any object store with a
//! conditional "if-none-match" write)
//! Testing: `InMemoryArtifactStore`

use crate::error::ArtifactResult;
use async_trait::async_trait;
use shared_types::ArtifactRef;

/// Namespaced blob storage with create-if-absent writes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` at `artifact`.
    ///
    /// Fails with `ArtifactError::AlreadyExists` if anything is already
    /// stored there. A failed put leaves nothing behind.
    async fn put(&self, artifact: &ArtifactRef, bytes: Vec<u8>) -> ArtifactResult<()>;

    /// Read the bytes stored at `artifact`.
    async fn get(&self, artifact: &ArtifactRef) -> ArtifactResult<Vec<u8>>;

    /// Whether an artifact is stored at `artifact`.
    async fn exists(&self, artifact: &ArtifactRef) -> ArtifactResult<bool>;
}
