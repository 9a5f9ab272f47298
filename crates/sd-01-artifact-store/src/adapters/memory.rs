use crate::domain::validate_path;
use crate::error::{ArtifactError, ArtifactResult};
use crate::ports::ArtifactStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ArtifactNamespace, ArtifactRef};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// In-memory artifact store for unit tests and single-process setups.
///
/// The create-if-absent check and the insert happen under one write lock.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    blobs: RwLock<HashMap<ArtifactRef, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts stored in `namespace`.
    pub fn count(&self, namespace: ArtifactNamespace) -> usize {
        self.blobs
            .read()
            .keys()
            .filter(|artifact| artifact.namespace == namespace)
            .count()
    }

    /// Total number of stored artifacts.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, artifact: &ArtifactRef, bytes: Vec<u8>) -> ArtifactResult<()> {
        validate_path(&artifact.path)?;

        match self.blobs.write().entry(artifact.clone()) {
            Entry::Occupied(_) => Err(ArtifactError::AlreadyExists {
                artifact: artifact.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(bytes);
                Ok(())
            }
        }
    }

    async fn get(&self, artifact: &ArtifactRef) -> ArtifactResult<Vec<u8>> {
        self.blobs
            .read()
            .get(artifact)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                artifact: artifact.clone(),
            })
    }

    async fn exists(&self, artifact: &ArtifactRef) -> ArtifactResult<bool> {
        Ok(self.blobs.read().contains_key(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{DeliveryId, TenantId};

    fn original_ref() -> ArtifactRef {
        ArtifactRef::original(TenantId::new(), DeliveryId::new())
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryArtifactStore::new();
        let artifact = original_ref();

        store.put(&artifact, b"%PDF-1.7".to_vec()).await.unwrap();

        assert_eq!(store.get(&artifact).await.unwrap(), b"%PDF-1.7".to_vec());
        assert!(store.exists(&artifact).await.unwrap());
        assert_eq!(store.count(ArtifactNamespace::Original), 1);
    }

    #[tokio::test]
    async fn test_second_put_is_rejected_and_keeps_first() {
        let store = InMemoryArtifactStore::new();
        let artifact = original_ref();

        store.put(&artifact, b"first".to_vec()).await.unwrap();
        let err = store.put(&artifact, b"second".to_vec()).await.unwrap_err();

        assert!(matches!(err, ArtifactError::AlreadyExists { .. }));
        assert_eq!(store.get(&artifact).await.unwrap(), b"first".to_vec());
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let store = InMemoryArtifactStore::new();
        let a = ArtifactRef::new(ArtifactNamespace::Original, "t/d/file");
        let b = ArtifactRef::new(ArtifactNamespace::Final, "t/d/file");

        store.put(&a, vec![1]).await.unwrap();
        store.put(&b, vec![2]).await.unwrap();

        assert_eq!(store.get(&a).await.unwrap(), vec![1]);
        assert_eq!(store.get(&b).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryArtifactStore::new();
        let err = store.get(&original_ref()).await.unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_path_is_rejected() {
        let store = InMemoryArtifactStore::new();
        let bad = ArtifactRef::new(ArtifactNamespace::Signature, "../escape.png");
        assert!(matches!(
            store.put(&bad, vec![0]).await,
            Err(ArtifactError::InvalidPath { .. })
        ));
        assert!(store.is_empty());
    }
}
