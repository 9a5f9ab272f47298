//! # File Delivery Repository
//!
//! One JSON document per record under `{root}/{id}.json`. Conditional
//! updates take an exclusive `fs2` lock on `{root}/{id}.lock`, read the
//! record, apply the transition and replace the document with a temp file
//! plus rename. The lock is advisory and shared by every process using the
//! same directory, so the compare-and-set holds across processes.
//!
//! Lock files are created only for records that exist and are kept for the
//! record's lifetime. Deleting one while another process waits on it would
//! let two holders lock different inodes.

use crate::domain::transitions;
use crate::domain::{FinalizationCommit, LockAttempt};
use crate::error::{RepositoryError, RepositoryResult};
use crate::ports::DeliveryRepository;
use async_trait::async_trait;
use fs2::FileExt;
use shared_types::{ArtifactRef, DeliveryId, DeliveryRecord, Timestamp};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File-backed delivery repository.
#[derive(Clone)]
pub struct FileDeliveryRepository {
    root: PathBuf,
}

fn storage_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage {
        reason: e.to_string(),
    }
}

/// Exclusive per-record lock, released on drop.
struct RecordLock {
    file: File,
}

impl RecordLock {
    fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "[sd-05] Failed to release record file lock");
        }
    }
}

impl FileDeliveryRepository {
    /// Open (and create) a repository rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(storage_error)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: DeliveryId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    fn lock_path(&self, id: DeliveryId) -> PathBuf {
        self.root.join(format!("{}.lock", id))
    }

    fn read(path: &Path, id: DeliveryId) -> RepositoryResult<DeliveryRecord> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound { id })
            }
            Err(e) => return Err(storage_error(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Storage {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    fn write(path: &Path, record: &DeliveryRecord) -> RepositoryResult<()> {
        let bytes = serde_json::to_vec_pretty(record).map_err(storage_error)?;
        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp).map_err(storage_error)?;
        file.write_all(&bytes).map_err(storage_error)?;
        file.sync_all().map_err(storage_error)?;
        fs::rename(&tmp, path).map_err(storage_error)
    }

    /// Every readable record matching `filter`. Foreign files are ignored.
    async fn scan<F>(&self, filter: F) -> RepositoryResult<Vec<DeliveryRecord>>
    where
        F: Fn(&DeliveryRecord) -> bool + Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let mut matching = Vec::new();
            for entry in fs::read_dir(&root).map_err(storage_error)? {
                let path = entry.map_err(storage_error)?.path();
                let id = match path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_suffix(".json"))
                    .and_then(|stem| stem.parse::<DeliveryId>().ok())
                {
                    Some(id) => id,
                    None => continue,
                };
                match Self::read(&path, id) {
                    Ok(record) if filter(&record) => matching.push(record),
                    Ok(_) | Err(RepositoryError::NotFound { .. }) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "[sd-05] Skipping unreadable record"),
                }
            }
            Ok(matching)
        })
        .await
        .map_err(storage_error)?
    }

    /// Run `f` as one atomic read-modify-write on record `id`.
    ///
    /// `f` returns the value to hand back and whether the record changed.
    async fn update<T, F>(&self, id: DeliveryId, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DeliveryRecord) -> RepositoryResult<(T, bool)> + Send + 'static,
    {
        let record_path = self.record_path(id);
        let lock_path = self.lock_path(id);

        tokio::task::spawn_blocking(move || {
            if !record_path.exists() {
                return Err(RepositoryError::NotFound { id });
            }
            let _lock = RecordLock::acquire(&lock_path).map_err(storage_error)?;
            let mut record = Self::read(&record_path, id)?;
            let (value, changed) = f(&mut record)?;
            if changed {
                Self::write(&record_path, &record)?;
            }
            Ok(value)
        })
        .await
        .map_err(storage_error)?
    }
}

#[async_trait]
impl DeliveryRepository for FileDeliveryRepository {
    async fn insert(&self, record: DeliveryRecord) -> RepositoryResult<()> {
        let record_path = self.record_path(record.id);
        let lock_path = self.lock_path(record.id);

        tokio::task::spawn_blocking(move || {
            let _lock = RecordLock::acquire(&lock_path).map_err(storage_error)?;
            if record_path.exists() {
                return Err(RepositoryError::Duplicate { id: record.id });
            }
            Self::write(&record_path, &record)
        })
        .await
        .map_err(storage_error)?
    }

    async fn load(&self, id: DeliveryId) -> RepositoryResult<DeliveryRecord> {
        let record_path = self.record_path(id);
        tokio::task::spawn_blocking(move || Self::read(&record_path, id))
            .await
            .map_err(storage_error)?
    }

    async fn attach_signature(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, move |record| {
            transitions::attach_signature(record, artifact)?;
            Ok((record.clone(), true))
        })
        .await
    }

    async fn attach_original(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, move |record| {
            transitions::attach_original(record, artifact)?;
            Ok((record.clone(), true))
        })
        .await
    }

    async fn try_acquire_lock(
        &self,
        id: DeliveryId,
        now: Timestamp,
        stale_before: Option<Timestamp>,
    ) -> RepositoryResult<LockAttempt> {
        self.update(id, move |record| {
            let attempt = transitions::acquire_lock(record, now, stale_before);
            let changed = matches!(attempt, LockAttempt::Acquired { .. });
            Ok((attempt, changed))
        })
        .await
    }

    async fn complete_finalization(
        &self,
        id: DeliveryId,
        lock_token: Timestamp,
        commit: FinalizationCommit,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, move |record| {
            transitions::complete(record, lock_token, commit)?;
            Ok((record.clone(), true))
        })
        .await
    }

    async fn release_lock(&self, id: DeliveryId, lock_token: Timestamp) -> RepositoryResult<bool> {
        self.update(id, move |record| {
            let released = transitions::release(record, lock_token);
            Ok((released, released))
        })
        .await
    }

    async fn list_pending_finalization(&self) -> RepositoryResult<Vec<DeliveryRecord>> {
        let mut pending = self.scan(DeliveryRecord::awaits_finalization).await?;
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn list_finalized_since(&self, since: Timestamp) -> RepositoryResult<Vec<DeliveryRecord>> {
        let mut finalized = self
            .scan(move |r| r.is_finalized() && r.finalized_at.is_some_and(|at| at >= since))
            .await?;
        finalized.sort_by_key(|r| r.finalized_at);
        Ok(finalized)
    }
}
