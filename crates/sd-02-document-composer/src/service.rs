//! PDF composition service.

use crate::domain::certification_page::CertificationPage;
use crate::domain::integrity::sha256_hex;
use crate::domain::page_tree::{materialize_inherited, reparent};
use crate::domain::signature_image::SignatureImage;
use crate::domain::{ComposeRequest, ComposedDocument};
use crate::error::{ComposeError, ComposeResult};
use crate::ports::DocumentComposer;
use delivery_telemetry::{HistogramTimer, COMPOSE_DURATION};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

/// Transparency (soft masks) needs PDF 1.4.
const MIN_PDF_VERSION: &str = "1.4";

/// Document-level entries copied from the original catalog.
const CARRIED_CATALOG_KEYS: &[&[u8]] = &[
    b"AcroForm",
    b"Outlines",
    b"Names",
    b"ViewerPreferences",
    b"PageMode",
    b"PageLayout",
    b"Lang",
    b"Metadata",
];

/// `lopdf`-backed [`DocumentComposer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfComposer;

impl PdfComposer {
    pub fn new() -> Self {
        Self
    }
}

fn load_original(bytes: &[u8]) -> ComposeResult<Document> {
    let doc = Document::load_mem(bytes).map_err(|e| ComposeError::InvalidOriginal {
        reason: e.to_string(),
    })?;
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(ComposeError::EncryptedOriginal);
    }
    Ok(doc)
}

fn carried_catalog_entries(doc: &Document) -> Vec<(Vec<u8>, Object)> {
    let catalog = match doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
    {
        Ok(catalog) => catalog,
        Err(_) => return Vec::new(),
    };
    CARRIED_CATALOG_KEYS
        .iter()
        .filter_map(|&key| catalog.get(key).ok().map(|value| (key.to_vec(), value.clone())))
        .collect()
}

/// Number of pages in a serialized PDF.
pub fn page_count(bytes: &[u8]) -> ComposeResult<usize> {
    Ok(load_original(bytes)?.get_pages().len())
}

impl DocumentComposer for PdfComposer {
    fn compose(&self, request: &ComposeRequest) -> ComposeResult<ComposedDocument> {
        let _timer = HistogramTimer::new(&COMPOSE_DURATION);

        // Digest of the bytes as received, before any parsing.
        let original_hash = sha256_hex(&request.original_pdf);

        let signature = SignatureImage::decode(&request.signature_image)?;
        let mut doc = load_original(&request.original_pdf)?;

        let originals: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if originals.is_empty() {
            return Err(ComposeError::EmptyOriginal);
        }
        debug!(
            delivery_id = %request.metadata.delivery_id,
            pages = originals.len(),
            "[sd-02] Original parsed"
        );

        materialize_inherited(&mut doc, &originals)?;
        let carried = carried_catalog_entries(&doc);

        let pages_id = doc.new_object_id();
        reparent(&mut doc, &originals, pages_id)?;

        let certification = CertificationPage::new(&request.metadata, &original_hash, &signature)
            .append_to(&mut doc, pages_id)?;

        let kids: Vec<Object> = originals
            .iter()
            .chain(std::iter::once(&certification))
            .map(|&id| Object::Reference(id))
            .collect();
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        for (key, value) in carried {
            catalog.set(key, value);
        }
        let catalog_id = doc.add_object(catalog);

        let info = doc.trailer.get(b"Info").ok().cloned();
        doc.trailer = Dictionary::new();
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            doc.trailer.set("Info", info);
        }
        doc.prune_objects();

        if doc.version.as_str() < MIN_PDF_VERSION {
            doc.version = MIN_PDF_VERSION.to_string();
        }

        let pages = doc.get_pages();
        let expected = originals.len() + 1;
        if pages.len() != expected || pages.values().last() != Some(&certification) {
            return Err(ComposeError::PageCountMismatch {
                expected,
                actual: pages.len(),
            });
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| ComposeError::Serialize {
                reason: e.to_string(),
            })?;

        info!(
            delivery_id = %request.metadata.delivery_id,
            original_pages = originals.len(),
            size = bytes.len(),
            "[sd-02] Document composed"
        );

        Ok(ComposedDocument {
            bytes,
            original_hash,
            original_pages: originals.len(),
            final_pages: expected,
        })
    }
}
