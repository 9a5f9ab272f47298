use crate::domain::validate_path;
use crate::error::{ArtifactError, ArtifactResult};
use crate::ports::ArtifactStore;
use async_trait::async_trait;
use shared_types::ArtifactRef;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Filesystem-backed artifact store.
///
/// Layout: `{root}/{namespace}/{tenant}/{delivery}/{file}`.
///
/// Writes go to a uniquely named temp file first and are then published
/// with a hard link, which fails atomically when the destination exists.
/// Readers never observe a partially written artifact and two concurrent
/// puts to the same reference cannot both succeed.
pub struct FileSystemArtifactStore {
    root: PathBuf,
}

impl FileSystemArtifactStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, artifact: &ArtifactRef) -> ArtifactResult<PathBuf> {
        validate_path(&artifact.path)?;
        Ok(self.root.join(artifact.namespace.as_str()).join(&artifact.path))
    }

    async fn write_temp(tmp: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn discard(tmp: &Path) {
        if let Err(e) = fs::remove_file(tmp).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "[sd-01] Failed to remove temp file");
            }
        }
    }
}

fn io_error(e: io::Error) -> ArtifactError {
    ArtifactError::Io {
        message: e.to_string(),
    }
}

#[async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    async fn put(&self, artifact: &ArtifactRef, bytes: Vec<u8>) -> ArtifactResult<()> {
        let dest = self.resolve(artifact)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let file_name = dest
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("artifact");
        let tmp = dest.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = Self::write_temp(&tmp, &bytes).await {
            Self::discard(&tmp).await;
            return Err(io_error(e));
        }

        let published = fs::hard_link(&tmp, &dest).await;
        Self::discard(&tmp).await;

        match published {
            Ok(()) => {
                debug!(artifact = %artifact, size = bytes.len(), "[sd-01] Artifact stored");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ArtifactError::AlreadyExists {
                    artifact: artifact.clone(),
                })
            }
            Err(e) => Err(io_error(e)),
        }
    }

    async fn get(&self, artifact: &ArtifactRef) -> ArtifactResult<Vec<u8>> {
        let path = self.resolve(artifact)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound {
                artifact: artifact.clone(),
            },
            _ => io_error(e),
        })
    }

    async fn exists(&self, artifact: &ArtifactRef) -> ArtifactResult<bool> {
        let path = self.resolve(artifact)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e)),
        }
    }
}
