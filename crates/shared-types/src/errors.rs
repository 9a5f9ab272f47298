//! # Error Types
//!
//! Parsing errors for the shared identifiers and enums.

use thiserror::Error;

/// Errors produced when parsing shared types from their string forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Identifier is not a valid UUID.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Status string does not name a known lifecycle state.
    #[error("Unknown delivery status: {0}")]
    UnknownStatus(String),

    /// Namespace string does not name a known artifact namespace.
    #[error("Unknown artifact namespace: {0}")]
    UnknownNamespace(String),
}
