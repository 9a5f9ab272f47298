//! Domain layer for the Document Composer
//!
//! - `integrity` - whole-file SHA-256 digest
//! - `layout` - certification page geometry and text encoding
//! - `page_tree` - re-parenting and inherited page attributes
//! - `signature_image` - PNG/JPEG decoding
//! - `certification_page` - page content and resource objects

pub mod certification_page;
pub mod integrity;
pub mod layout;
pub mod page_tree;
pub mod signature_image;

use shared_types::{DeliveryId, Timestamp};

/// Data printed in the metadata block of the certification page.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificationMetadata {
    pub business_name: String,
    /// Printed as `none` when absent or blank.
    pub doc_number: Option<String>,
    pub signer_name: String,
    pub delivery_id: DeliveryId,
    pub signed_at: Timestamp,
    /// Footer timestamp. Passed in so composition depends only on its inputs.
    pub generated_at: Timestamp,
}

impl CertificationMetadata {
    /// Document number as printed.
    pub fn doc_number_label(&self) -> &str {
        match self.doc_number.as_deref().map(str::trim) {
            Some(doc) if !doc.is_empty() => doc,
            _ => "none",
        }
    }
}

/// Input to a composition.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub original_pdf: Vec<u8>,
    pub signature_image: Vec<u8>,
    pub metadata: CertificationMetadata,
}

/// Output of a composition.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    /// Serialized final PDF.
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of the original bytes as received.
    pub original_hash: String,
    pub original_pages: usize,
    pub final_pages: usize,
}
