//! Error types for the Access Token subsystem

use thiserror::Error;

/// Access token errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Generated token collided with an existing one
    #[error("Token already exists")]
    Duplicate,

    /// Time-to-live must be positive
    #[error("Invalid token TTL: {seconds}s")]
    InvalidTtl { seconds: i64 },

    /// Backing store failure
    #[error("Token storage error: {reason}")]
    Storage { reason: String },
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
