//! TryFinalize results.

use sd_03_access_tokens::AccessToken;
use shared_types::{ArtifactRef, DeliveryStatus, Timestamp};
use std::fmt;

/// Why a finalization attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No such delivery.
    NotFound,
    /// Record is `CLOSED` or `EXPIRED`. Not retriable.
    TerminalState(DeliveryStatus),
    /// Artifact download or upload failed.
    Artifact(String),
    /// Composition failed.
    Composition(String),
    /// Record store failed or the lock was lost.
    Persistence(String),
}

impl FailureReason {
    /// Whether a later trigger may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FailureReason::Artifact(_) | FailureReason::Composition(_) | FailureReason::Persistence(_)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "not_found",
            FailureReason::TerminalState(_) => "terminal_state",
            FailureReason::Artifact(_) => "artifact",
            FailureReason::Composition(_) => "composition",
            FailureReason::Persistence(_) => "persistence",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotFound => f.write_str("delivery not found"),
            FailureReason::TerminalState(status) => write!(f, "delivery is {}", status),
            FailureReason::Artifact(detail) => write!(f, "artifact error: {}", detail),
            FailureReason::Composition(detail) => write!(f, "composition error: {}", detail),
            FailureReason::Persistence(detail) => write!(f, "persistence error: {}", detail),
        }
    }
}

/// Result of a successful finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizationReport {
    pub final_ref: ArtifactRef,
    pub original_hash: String,
    pub final_size: u64,
    pub finalized_at: Timestamp,
    /// `None` only if issuing failed after the record was finalized.
    pub pickup_token: Option<AccessToken>,
    /// Issued only when the signer has an email address.
    pub email_token: Option<AccessToken>,
}

/// `TryFinalize` outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum TryFinalizeOutcome {
    /// This call composed and committed the final document.
    Finalized(FinalizationReport),
    AlreadyFinalized,
    /// An artifact is still missing.
    NotReady,
    /// Another attempt holds the lock.
    LockHeld,
    Failed(FailureReason),
}

impl TryFinalizeOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, TryFinalizeOutcome::Finalized(_))
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            TryFinalizeOutcome::Finalized(_) => "finalized",
            TryFinalizeOutcome::AlreadyFinalized => "already_finalized",
            TryFinalizeOutcome::NotReady => "not_ready",
            TryFinalizeOutcome::LockHeld => "lock_held",
            TryFinalizeOutcome::Failed(_) => "failed",
        }
    }
}
