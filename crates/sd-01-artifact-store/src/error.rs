//! Error types for the Artifact Store subsystem

use shared_types::ArtifactRef;
use thiserror::Error;

/// Artifact store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// An artifact already exists at this reference (no overwrite)
    #[error("Artifact already exists: {artifact}")]
    AlreadyExists { artifact: ArtifactRef },

    /// Nothing stored at this reference
    #[error("Artifact not found: {artifact}")]
    NotFound { artifact: ArtifactRef },

    /// Path is empty, absolute or escapes its namespace
    #[error("Invalid artifact path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Underlying storage I/O failure
    #[error("Artifact storage I/O error: {message}")]
    Io { message: String },
}

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, ArtifactError>;
