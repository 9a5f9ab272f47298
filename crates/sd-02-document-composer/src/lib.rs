//! # Document Composer (sd-02)
//!
//! Merges an original PDF and a signature image into the final certified
//! document.
//!
//! ## Algorithm
//!
//! ```text
//! original bytes ──sha256──→ original_hash
//!       │
//!       ▼
//!   parse pages ──materialise inherited attributes──→ re-parent under new Pages
//!                                                          │
//! signature image ──decode──→ CertificationPage ──append last──┘
//!                                                          │
//!                                                          ▼
//!                                                   serialize final bytes
//! ```
//!
//! ## Guarantees
//!
//! - The hash certifies the bytes exactly as received.
//! - Original page content streams are carried over untouched and in order.
//! - `page_count(final) == page_count(original) + 1`, certification page last.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sd_02_document_composer::{ComposeRequest, DocumentComposer, PdfComposer};
//!
//! let composed = PdfComposer::new().compose(&ComposeRequest {
//!     original_pdf,
//!     signature_image,
//!     metadata,
//! })?;
//! store.put(&final_ref, composed.bytes).await?;
//! ```

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::integrity;
pub use domain::signature_image::{SignatureFormat, SignatureImage};
pub use domain::{CertificationMetadata, ComposeRequest, ComposedDocument};
pub use error::{ComposeError, ComposeResult};
pub use ports::DocumentComposer;
pub use service::{page_count, PdfComposer};
