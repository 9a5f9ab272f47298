use crate::domain::transitions;
use crate::domain::{FinalizationCommit, LockAttempt};
use crate::error::{RepositoryError, RepositoryResult};
use crate::ports::DeliveryRepository;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ArtifactRef, DeliveryId, DeliveryRecord, Timestamp};
use std::collections::HashMap;

/// In-memory delivery repository.
///
/// Every conditional update runs inside one critical section of the map
/// mutex.
#[derive(Default)]
pub struct InMemoryDeliveryRepository {
    records: Mutex<HashMap<DeliveryId, DeliveryRecord>>,
}

impl InMemoryDeliveryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T>(
        &self,
        id: DeliveryId,
        f: impl FnOnce(&mut DeliveryRecord) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound { id })?;
        f(record)
    }
}

#[async_trait]
impl DeliveryRepository for InMemoryDeliveryRepository {
    async fn insert(&self, record: DeliveryRecord) -> RepositoryResult<()> {
        let mut records = self.records.lock();
        if records.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate { id: record.id });
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn load(&self, id: DeliveryId) -> RepositoryResult<DeliveryRecord> {
        self.records
            .lock()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound { id })
    }

    async fn attach_signature(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, |record| {
            transitions::attach_signature(record, artifact)?;
            Ok(record.clone())
        })
    }

    async fn attach_original(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, |record| {
            transitions::attach_original(record, artifact)?;
            Ok(record.clone())
        })
    }

    async fn try_acquire_lock(
        &self,
        id: DeliveryId,
        now: Timestamp,
        stale_before: Option<Timestamp>,
    ) -> RepositoryResult<LockAttempt> {
        self.update(id, |record| {
            Ok(transitions::acquire_lock(record, now, stale_before))
        })
    }

    async fn complete_finalization(
        &self,
        id: DeliveryId,
        lock_token: Timestamp,
        commit: FinalizationCommit,
    ) -> RepositoryResult<DeliveryRecord> {
        self.update(id, |record| {
            transitions::complete(record, lock_token, commit)?;
            Ok(record.clone())
        })
    }

    async fn release_lock(&self, id: DeliveryId, lock_token: Timestamp) -> RepositoryResult<bool> {
        self.update(id, |record| Ok(transitions::release(record, lock_token)))
    }

    async fn list_pending_finalization(&self) -> RepositoryResult<Vec<DeliveryRecord>> {
        let mut pending: Vec<_> = self
            .records
            .lock()
            .values()
            .filter(|r| r.awaits_finalization())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn list_finalized_since(&self, since: Timestamp) -> RepositoryResult<Vec<DeliveryRecord>> {
        let mut finalized: Vec<_> = self
            .records
            .lock()
            .values()
            .filter(|r| r.is_finalized() && r.finalized_at.is_some_and(|at| at >= since))
            .cloned()
            .collect();
        finalized.sort_by_key(|r| r.finalized_at);
        Ok(finalized)
    }
}
