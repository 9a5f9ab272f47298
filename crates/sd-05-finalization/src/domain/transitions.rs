//! Conditional record updates.
//!
//! Each function is the body of one atomic read-modify-write. Repository
//! adapters run them while holding exclusive access to the record, so the
//! check and the write can never be split by another caller.

use crate::error::{RepositoryError, RepositoryResult};
use shared_types::{ArtifactNamespace, ArtifactRef, DeliveryRecord, DeliveryStatus, Timestamp};

/// Result of a lock acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LockAttempt {
    /// Lock taken. `lock_token` must be presented to commit or release.
    Acquired {
        record: DeliveryRecord,
        lock_token: Timestamp,
        /// Previous holder's token when an abandoned lock was taken over.
        displaced: Option<Timestamp>,
    },
    /// Another attempt holds the lock.
    Held { since: Timestamp },
    AlreadyFinalized,
    NotReady,
    Terminal(DeliveryStatus),
}

/// Values written by a successful finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizationCommit {
    pub final_doc_ref: ArtifactRef,
    pub original_hash: String,
    pub finalized_at: Timestamp,
}

fn ensure_accepts_artifacts(record: &DeliveryRecord) -> RepositoryResult<()> {
    if record.status.accepts_artifacts() && record.final_doc_ref.is_none() {
        Ok(())
    } else {
        Err(RepositoryError::InvalidState {
            id: record.id,
            status: record.status,
        })
    }
}

/// Set the signature pointer once. Status becomes `SIGNED`.
pub fn attach_signature(record: &mut DeliveryRecord, artifact: ArtifactRef) -> RepositoryResult<()> {
    ensure_accepts_artifacts(record)?;
    if record.signature_ref.is_some() {
        return Err(RepositoryError::ArtifactAlreadyAttached {
            id: record.id,
            namespace: ArtifactNamespace::Signature,
        });
    }
    record.signature_ref = Some(artifact);
    record.status = DeliveryStatus::Signed;
    Ok(())
}

/// Set the original document pointer once. Status becomes `DOC_UPLOADED`.
pub fn attach_original(record: &mut DeliveryRecord, artifact: ArtifactRef) -> RepositoryResult<()> {
    ensure_accepts_artifacts(record)?;
    if record.original_doc_ref.is_some() {
        return Err(RepositoryError::ArtifactAlreadyAttached {
            id: record.id,
            namespace: ArtifactNamespace::Original,
        });
    }
    record.original_doc_ref = Some(artifact);
    record.status = DeliveryStatus::DocUploaded;
    Ok(())
}

/// Take the finalization lock if it is free, or if it was taken before
/// `stale_before`.
pub fn acquire_lock(
    record: &mut DeliveryRecord,
    now: Timestamp,
    stale_before: Option<Timestamp>,
) -> LockAttempt {
    if record.is_finalized() {
        return LockAttempt::AlreadyFinalized;
    }
    if record.status.is_terminal() {
        return LockAttempt::Terminal(record.status);
    }
    if !record.has_all_artifacts() {
        return LockAttempt::NotReady;
    }

    let displaced = match record.finalizing_at {
        None => None,
        Some(since) if stale_before.is_some_and(|cutoff| since < cutoff) => Some(since),
        Some(since) => return LockAttempt::Held { since },
    };

    record.finalizing_at = Some(now);
    LockAttempt::Acquired {
        record: record.clone(),
        lock_token: now,
        displaced,
    }
}

/// Move to `FINALIZED` if `lock_token` still holds the lock.
pub fn complete(
    record: &mut DeliveryRecord,
    lock_token: Timestamp,
    commit: FinalizationCommit,
) -> RepositoryResult<()> {
    if record.finalizing_at != Some(lock_token) || record.final_doc_ref.is_some() {
        return Err(RepositoryError::LockNotHeld { id: record.id });
    }
    record.status = DeliveryStatus::Finalized;
    record.final_doc_ref = Some(commit.final_doc_ref);
    record.original_hash = Some(commit.original_hash);
    record.finalized_at = Some(commit.finalized_at);
    record.finalizing_at = None;
    Ok(())
}

/// Clear the lock if `lock_token` still holds it. Returns whether it did.
pub fn release(record: &mut DeliveryRecord, lock_token: Timestamp) -> bool {
    if record.finalizing_at == Some(lock_token) {
        record.finalizing_at = None;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use shared_types::TenantId;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn ready() -> DeliveryRecord {
        let mut r = DeliveryRecord::new(TenantId::new(), "Acme", "Jane", t0());
        let sig = ArtifactRef::signature(r.tenant_id, r.id, "png");
        let orig = ArtifactRef::original(r.tenant_id, r.id);
        attach_signature(&mut r, sig).unwrap();
        attach_original(&mut r, orig).unwrap();
        r
    }

    fn commit(r: &DeliveryRecord) -> FinalizationCommit {
        FinalizationCommit {
            final_doc_ref: ArtifactRef::final_document(r.tenant_id, r.id),
            original_hash: "00".repeat(32),
            finalized_at: t0(),
        }
    }

    #[test]
    fn test_status_follows_last_artifact() {
        let mut r = DeliveryRecord::new(TenantId::new(), "Acme", "Jane", t0());
        let orig = ArtifactRef::original(r.tenant_id, r.id);
        let sig = ArtifactRef::signature(r.tenant_id, r.id, "png");
        attach_original(&mut r, orig).unwrap();
        assert_eq!(r.status, DeliveryStatus::DocUploaded);
        attach_signature(&mut r, sig).unwrap();
        assert_eq!(r.status, DeliveryStatus::Signed);
    }

    #[test]
    fn test_pointers_are_set_once() {
        let mut r = ready();
        let sig = ArtifactRef::signature(r.tenant_id, r.id, "jpg");
        let err = attach_signature(&mut r, sig).unwrap_err();
        assert!(matches!(err, RepositoryError::ArtifactAlreadyAttached { .. }));
    }

    #[test]
    fn test_second_acquire_sees_held() {
        let mut r = ready();
        assert!(matches!(
            acquire_lock(&mut r, t0(), None),
            LockAttempt::Acquired { displaced: None, .. }
        ));
        assert_eq!(
            acquire_lock(&mut r, t0() + Duration::seconds(1), None),
            LockAttempt::Held { since: t0() }
        );
    }

    #[test]
    fn test_not_ready_leaves_lock_untouched() {
        let mut r = DeliveryRecord::new(TenantId::new(), "Acme", "Jane", t0());
        assert_eq!(acquire_lock(&mut r, t0(), None), LockAttempt::NotReady);
        assert!(r.finalizing_at.is_none());
    }

    #[test]
    fn test_stale_lock_taken_over() {
        let mut r = ready();
        r.finalizing_at = Some(t0());
        let now = t0() + Duration::minutes(11);

        let fresh = acquire_lock(&mut r, now, Some(now - Duration::minutes(20)));
        assert_eq!(fresh, LockAttempt::Held { since: t0() });

        match acquire_lock(&mut r, now, Some(now - Duration::minutes(10))) {
            LockAttempt::Acquired {
                lock_token,
                displaced,
                ..
            } => {
                assert_eq!(lock_token, now);
                assert_eq!(displaced, Some(t0()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_displaced_holder_cannot_commit_or_release() {
        let mut r = ready();
        r.finalizing_at = Some(t0());
        let now = t0() + Duration::minutes(11);
        acquire_lock(&mut r, now, Some(now - Duration::minutes(10)));

        assert!(!release(&mut r, t0()));
        let c = commit(&r);
        assert!(matches!(
            complete(&mut r, t0(), c),
            Err(RepositoryError::LockNotHeld { .. })
        ));
        assert_eq!(r.finalizing_at, Some(now));
    }

    #[test]
    fn test_complete_sets_final_state_and_clears_lock() {
        let mut r = ready();
        acquire_lock(&mut r, t0(), None);
        let c = commit(&r);
        complete(&mut r, t0(), c).unwrap();

        assert_eq!(r.status, DeliveryStatus::Finalized);
        assert!(r.final_doc_ref.is_some());
        assert!(r.finalizing_at.is_none());
        assert_eq!(acquire_lock(&mut r, t0(), None), LockAttempt::AlreadyFinalized);
    }

    #[test]
    fn test_terminal_record_not_locked() {
        let mut r = ready();
        r.status = DeliveryStatus::Closed;
        assert_eq!(
            acquire_lock(&mut r, t0(), None),
            LockAttempt::Terminal(DeliveryStatus::Closed)
        );
        let sig = ArtifactRef::signature(r.tenant_id, r.id, "png");
        assert!(attach_signature(&mut r, sig).is_err());
    }
}
