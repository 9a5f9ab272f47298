use super::memory::set_once;
use crate::domain::AccessToken;
use crate::error::{TokenError, TokenResult};
use crate::ports::TokenStore;
use async_trait::async_trait;
use fs2::FileExt;
use shared_types::{DeliveryId, Timestamp};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type TokenMap = HashMap<String, AccessToken>;

/// Token store persisted as a single JSON document.
///
/// Nothing is cached in memory. Every mutation is a read-modify-write of
/// the file under an exclusive `fs2` lock on `{path}.lock`, and the new
/// snapshot is published with a temp file plus rename, so several
/// processes can share one file. Reads need no lock: they always see a
/// complete snapshot.
pub struct JsonFileTokenStore {
    path: PathBuf,
    lock_path: PathBuf,
}

fn storage_error(e: impl std::fmt::Display) -> TokenError {
    TokenError::Storage {
        reason: e.to_string(),
    }
}

/// Exclusive lock on the store file, released on drop.
struct StoreLock {
    file: File,
}

impl StoreLock {
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

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "[sd-03] Failed to release token store lock");
        }
    }
}

impl JsonFileTokenStore {
    /// Open the store at `path`. An existing file must parse.
    pub async fn open(path: impl Into<PathBuf>) -> TokenResult<Self> {
        let path = path.into();
        let store = Self {
            lock_path: path.with_extension("json.lock"),
            path,
        };
        let count = store.read(|tokens| tokens.len()).await?;
        debug!(path = %store.path.display(), count, "[sd-03] Token store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> TokenResult<TokenMap> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TokenMap::new()),
            Err(e) => return Err(storage_error(e)),
        };
        let list: Vec<AccessToken> = serde_json::from_slice(&bytes).map_err(|e| {
            TokenError::Storage {
                reason: format!("{}: {}", path.display(), e),
            }
        })?;
        Ok(list.into_iter().map(|t| (t.token.clone(), t)).collect())
    }

    fn persist(path: &Path, tokens: &TokenMap) -> TokenResult<()> {
        let mut list: Vec<&AccessToken> = tokens.values().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.token.cmp(&b.token)));
        let bytes = serde_json::to_vec_pretty(&list).map_err(storage_error)?;

        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp).map_err(storage_error)?;
        file.write_all(&bytes).map_err(storage_error)?;
        file.sync_all().map_err(storage_error)?;
        fs::rename(&tmp, path).map_err(storage_error)
    }

    /// Run `f` against the current snapshot on disk.
    async fn read<T, F>(&self, f: F) -> TokenResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TokenMap) -> T + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::load(&path).map(|tokens| f(&tokens)))
            .await
            .map_err(storage_error)?
    }

    /// Run `f` as one atomic read-modify-write of the file.
    ///
    /// `f` returns the value to hand back and whether the snapshot changed.
    async fn update<T, F>(&self, f: F) -> TokenResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut TokenMap) -> TokenResult<(T, bool)> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(storage_error)?;
            }
            let _lock = StoreLock::acquire(&lock_path).map_err(storage_error)?;
            let mut tokens = Self::load(&path)?;
            let (value, changed) = f(&mut tokens)?;
            if changed {
                Self::persist(&path, &tokens)?;
            }
            Ok(value)
        })
        .await
        .map_err(storage_error)?
    }
}

#[async_trait]
impl TokenStore for JsonFileTokenStore {
    async fn insert(&self, token: AccessToken) -> TokenResult<()> {
        self.update(move |tokens| {
            if tokens.contains_key(&token.token) {
                return Err(TokenError::Duplicate);
            }
            tokens.insert(token.token.clone(), token);
            Ok(((), true))
        })
        .await
    }

    async fn find(&self, token: &str) -> TokenResult<Option<AccessToken>> {
        let token = token.to_string();
        self.read(move |tokens| tokens.get(&token).cloned()).await
    }

    async fn mark_used(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>> {
        let token = token.to_string();
        self.update(move |tokens| {
            let first_use = tokens.get(&token).is_some_and(|t| t.used_at.is_none());
            let updated = set_once(tokens, &token, |t| {
                t.used_at.get_or_insert(at);
            });
            Ok((updated, first_use))
        })
        .await
    }

    async fn revoke(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>> {
        let token = token.to_string();
        self.update(move |tokens| {
            let first_revoke = tokens.get(&token).is_some_and(|t| t.revoked_at.is_none());
            let updated = set_once(tokens, &token, |t| {
                t.revoked_at.get_or_insert(at);
            });
            Ok((updated, first_revoke))
        })
        .await
    }

    async fn list_for_delivery(&self, delivery_id: DeliveryId) -> TokenResult<Vec<AccessToken>> {
        self.read(move |tokens| {
            let mut matching: Vec<_> = tokens
                .values()
                .filter(|t| t.delivery_id == delivery_id)
                .cloned()
                .collect();
            matching.sort_by_key(|t| t.created_at);
            matching
        })
        .await
    }
}
