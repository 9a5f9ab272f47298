//! # Finalization Coordinator (sd-05)
//!
//! Produces the final certified document of a delivery exactly once, no
//! matter how many triggers race (both upload handlers, retries, the
//! sweeper, several processes).
//!
//! ## Exactly-Once Protocol
//!
//! Mutual exclusion is a persistent lock stored on the record itself
//! (`finalizing_at`), acquired with one atomic conditional update:
//!
//! | Record state | Result |
//! |--------------|--------|
//! | `FINALIZED` | `AlreadyFinalized` |
//! | `CLOSED` / `EXPIRED` | `Failed(terminal_state)` |
//! | an artifact missing | `NotReady` |
//! | lock held, fresh | `LockHeld` |
//! | lock free or older than `lock_ttl` | acquired, lock token = `now` |
//!
//! The lock token must still match when committing `FINALIZED` or when
//! releasing after a failure, so an attempt whose lock was taken over can
//! neither commit nor clear its successor's lock.
//!
//! ## Side Effects
//!
//! Tokens, the `finalized` audit event and the notification happen only
//! after the commit. Token or notification failures never undo it.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{
    FileDeliveryRepository, InMemoryDeliveryRepository, RecordingNotifier, TracingNotifier,
};
pub use domain::{
    FailureReason, FinalizationCommit, FinalizationConfig, FinalizationReport, LockAttempt,
    TryFinalizeOutcome,
};
pub use error::{
    FinalizationError, FinalizationResult, NotificationError, RepositoryError, RepositoryResult,
};
pub use ports::{DeliveryNotifier, DeliveryRepository, FinalizationApi, FinalizationNotice};
pub use service::{FinalizationCoordinator, FinalizationPorts};
