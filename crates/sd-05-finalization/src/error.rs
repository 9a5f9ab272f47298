//! Error types for the Finalization subsystem

use sd_03_access_tokens::TokenError;
use shared_types::{ArtifactNamespace, DeliveryId, DeliveryStatus};
use thiserror::Error;

/// Delivery repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No record with this identifier
    #[error("Delivery not found: {id}")]
    NotFound { id: DeliveryId },

    /// A record with this identifier already exists
    #[error("Delivery already exists: {id}")]
    Duplicate { id: DeliveryId },

    /// Artifact pointer is already set and cannot be replaced
    #[error("Delivery {id} already has a {namespace} artifact")]
    ArtifactAlreadyAttached {
        id: DeliveryId,
        namespace: ArtifactNamespace,
    },

    /// Record state does not allow the update
    #[error("Delivery {id} is {status}")]
    InvalidState { id: DeliveryId, status: DeliveryStatus },

    /// Caller no longer holds the finalization lock
    #[error("Finalization lock for {id} is no longer held by this attempt")]
    LockNotHeld { id: DeliveryId },

    /// Backing store failure
    #[error("Repository storage error: {reason}")]
    Storage { reason: String },
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Notification delivery failure
#[derive(Debug, Clone, Error)]
#[error("Notification failed: {reason}")]
pub struct NotificationError {
    pub reason: String,
}

/// Finalization subsystem errors
#[derive(Debug, Error)]
pub enum FinalizationError {
    /// Configuration rejected
    #[error("Invalid finalization config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Result type for finalization operations
pub type FinalizationResult<T> = Result<T, FinalizationError>;
