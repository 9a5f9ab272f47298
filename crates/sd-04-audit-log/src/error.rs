//! Error types for the Audit Log subsystem

use thiserror::Error;

/// Audit log errors
#[derive(Debug, Error)]
pub enum AuditError {
    /// Event could not be encoded
    #[error("Audit event encoding failed: {reason}")]
    Encoding { reason: String },

    /// Sink write failed
    #[error("Audit sink write failed: {reason}")]
    Sink { reason: String },
}

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;
