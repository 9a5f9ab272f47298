//! Outbound ports: record store and notification channel.

use crate::domain::{FinalizationCommit, LockAttempt};
use crate::error::{NotificationError, RepositoryResult};
use async_trait::async_trait;
use shared_types::{ArtifactRef, DeliveryId, DeliveryRecord, TenantId, Timestamp};

/// Authoritative store of delivery records.
///
/// Every mutating method is a single atomic conditional update against the
/// backing store. Implementations must never split the check from the
/// write.
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    async fn insert(&self, record: DeliveryRecord) -> RepositoryResult<()>;

    async fn load(&self, id: DeliveryId) -> RepositoryResult<DeliveryRecord>;

    /// Set `signature_ref` if unset and the record still accepts artifacts.
    async fn attach_signature(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord>;

    /// Set `original_doc_ref` if unset and the record still accepts artifacts.
    async fn attach_original(
        &self,
        id: DeliveryId,
        artifact: ArtifactRef,
    ) -> RepositoryResult<DeliveryRecord>;

    /// Set `finalizing_at = now` only if the lock is free (or older than
    /// `stale_before`) and the record is ready and not finalized.
    async fn try_acquire_lock(
        &self,
        id: DeliveryId,
        now: Timestamp,
        stale_before: Option<Timestamp>,
    ) -> RepositoryResult<LockAttempt>;

    /// Transition to `FINALIZED` if `lock_token` still holds the lock.
    async fn complete_finalization(
        &self,
        id: DeliveryId,
        lock_token: Timestamp,
        commit: FinalizationCommit,
    ) -> RepositoryResult<DeliveryRecord>;

    /// Clear the lock if `lock_token` still holds it.
    async fn release_lock(&self, id: DeliveryId, lock_token: Timestamp) -> RepositoryResult<bool>;

    /// Records with both artifacts that are neither finalized nor terminal.
    async fn list_pending_finalization(&self) -> RepositoryResult<Vec<DeliveryRecord>>;

    /// Finalized records whose `finalized_at` is at or after `since`.
    async fn list_finalized_since(&self, since: Timestamp) -> RepositoryResult<Vec<DeliveryRecord>>;
}

/// Data handed to the notification channel after a finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizationNotice {
    pub delivery_id: DeliveryId,
    pub tenant_id: TenantId,
    pub doc_number: Option<String>,
    pub business_name: String,
    pub signer_name: String,
    pub recipient: String,
    pub download_url: String,
    pub expires_at: Timestamp,
}

/// Best-effort outbound notification (the delivery email).
#[async_trait]
pub trait DeliveryNotifier: Send + Sync {
    async fn delivery_finalized(&self, notice: FinalizationNotice) -> Result<(), NotificationError>;
}
