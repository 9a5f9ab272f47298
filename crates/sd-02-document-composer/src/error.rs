//! Error types for the Document Composer subsystem

use thiserror::Error;

/// Document composition errors
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Original bytes are not a readable PDF
    #[error("Original document could not be parsed: {reason}")]
    InvalidOriginal { reason: String },

    /// Original is encrypted; pages cannot be copied without the password
    #[error("Original document is encrypted")]
    EncryptedOriginal,

    /// Original parsed but contains no pages
    #[error("Original document has no pages")]
    EmptyOriginal,

    /// Signature image is not a supported PNG or JPEG
    #[error("Signature image rejected: {reason}")]
    InvalidSignature { reason: String },

    /// Page tree could not be rebuilt
    #[error("Page tree error: {reason}")]
    PageTree { reason: String },

    /// Output document failed the page-count check
    #[error("Composed document has {actual} pages, expected {expected}")]
    PageCountMismatch { expected: usize, actual: usize },

    /// Output could not be serialized
    #[error("Serialization failed: {reason}")]
    Serialize { reason: String },
}

impl From<lopdf::Error> for ComposeError {
    fn from(e: lopdf::Error) -> Self {
        ComposeError::PageTree {
            reason: e.to_string(),
        }
    }
}

/// Result type for composer operations
pub type ComposeResult<T> = Result<T, ComposeError>;
