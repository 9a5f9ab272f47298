//! Port definition for the Document Composer.

use crate::domain::{ComposeRequest, ComposedDocument};
use crate::error::ComposeResult;

/// Merges an original PDF and a signature image into a certified document.
///
/// Composition is CPU-bound and synchronous; async callers run it on a
/// blocking thread.
pub trait DocumentComposer: Send + Sync {
    /// Return the final document and the hash of the original bytes.
    ///
    /// The output always has exactly one page more than the original, with
    /// the certification page last.
    fn compose(&self, request: &ComposeRequest) -> ComposeResult<ComposedDocument>;
}
