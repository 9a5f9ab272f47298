//! Certification page rendering.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ CERTIFICATE OF SIGNED DELIVERY               │
//! │ ──────────────────────────────────────────── │
//! │ Business      <business name>                │
//! │ Document      <doc number | none>            │
//! │ Signer        <signer name>                  │
//! │ Signed at     <timestamp>                    │
//! │ Delivery ID   <uuid>                         │
//! │                                              │
//! │ Signature                                    │
//! │ ┌───────────────────┐                        │
//! │ │   <image, fit     │                        │
//! │ │    300 x 120>     │                        │
//! │ └───────────────────┘                        │
//! │ Integrity                                    │
//! │ SHA-256: <hex>                               │
//! │ <disclaimer, two lines>                      │
//! │                                              │
//! │ Generated by Signed Delivery - <timestamp>   │
//! └──────────────────────────────────────────────┘
//! ```

use super::layout::{
    clip, fit_signature, format_timestamp, win_ansi, BANNER, DISCLAIMER_LINES, FOOTER_PREFIX,
    MARGIN, PAGE_HEIGHT, PAGE_WIDTH, SIGNATURE_PADDING,
};
use super::signature_image::SignatureImage;
use super::CertificationMetadata;
use crate::error::{ComposeError, ComposeResult};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const SIGNATURE_XOBJECT: &str = "Sig";

/// Column where metadata values start.
const VALUE_OFFSET: f32 = 110.0;

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn text(font: &str, size: f32, x: f32, y: f32, value: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(font), real(size)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(
                win_ansi(value),
                lopdf::StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn fill_gray(level: f32) -> Operation {
    Operation::new("rg", vec![real(level), real(level), real(level)])
}

/// The certification page appended after the original pages.
pub struct CertificationPage<'a> {
    metadata: &'a CertificationMetadata,
    original_hash: &'a str,
    signature: &'a SignatureImage,
}

impl<'a> CertificationPage<'a> {
    pub fn new(
        metadata: &'a CertificationMetadata,
        original_hash: &'a str,
        signature: &'a SignatureImage,
    ) -> Self {
        Self {
            metadata,
            original_hash,
            signature,
        }
    }

    /// Metadata rows as `(label, value)`.
    pub fn rows(&self) -> [(&'static str, String); 5] {
        let m = self.metadata;
        [
            ("Business", clip(&m.business_name)),
            ("Document", clip(m.doc_number_label())),
            ("Signer", clip(&m.signer_name)),
            ("Signed at", format_timestamp(&m.signed_at)),
            ("Delivery ID", m.delivery_id.to_string()),
        ]
    }

    /// Page content stream operations.
    pub fn content(&self) -> Content {
        let mut ops = Vec::new();
        let right = PAGE_WIDTH - MARGIN;
        let mut y = PAGE_HEIGHT - MARGIN - 18.0;

        ops.push(fill_gray(0.1));
        ops.extend(text(FONT_BOLD, 18.0, MARGIN, y, BANNER));
        y -= 14.0;

        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", vec![real(0.6), real(0.6), real(0.6)]));
        ops.push(Operation::new("w", vec![real(1.0)]));
        ops.push(Operation::new("m", vec![real(MARGIN), real(y)]));
        ops.push(Operation::new("l", vec![real(right), real(y)]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
        y -= 30.0;

        for (label, value) in self.rows() {
            ops.extend(text(FONT_BOLD, 11.0, MARGIN, y, label));
            ops.extend(text(FONT_REGULAR, 11.0, MARGIN + VALUE_OFFSET, y, &value));
            y -= 20.0;
        }
        y -= 10.0;

        ops.extend(text(FONT_BOLD, 12.0, MARGIN, y, "Signature"));
        y -= 20.0;

        let (sig_w, sig_h) = fit_signature(self.signature.width, self.signature.height);
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", vec![real(0.8), real(0.8), real(0.8)]));
        ops.push(fill_gray(1.0));
        ops.push(Operation::new("w", vec![real(0.5)]));
        ops.push(Operation::new(
            "re",
            vec![
                real(MARGIN),
                real(y - sig_h - SIGNATURE_PADDING),
                real(sig_w + 2.0 * SIGNATURE_PADDING),
                real(sig_h + 2.0 * SIGNATURE_PADDING),
            ],
        ));
        ops.push(Operation::new("B", vec![]));
        ops.push(Operation::new("Q", vec![]));

        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                real(sig_w),
                real(0.0),
                real(0.0),
                real(sig_h),
                real(MARGIN + SIGNATURE_PADDING),
                real(y - sig_h),
            ],
        ));
        ops.push(Operation::new("Do", vec![name(SIGNATURE_XOBJECT)]));
        ops.push(Operation::new("Q", vec![]));
        y -= sig_h + SIGNATURE_PADDING + 30.0;

        ops.push(fill_gray(0.1));
        ops.extend(text(FONT_BOLD, 12.0, MARGIN, y, "Integrity"));
        y -= 18.0;
        ops.extend(text(
            FONT_REGULAR,
            9.0,
            MARGIN,
            y,
            &format!("SHA-256: {}", self.original_hash),
        ));
        y -= 24.0;
        ops.push(fill_gray(0.35));
        for (i, line) in DISCLAIMER_LINES.iter().enumerate() {
            ops.extend(text(FONT_REGULAR, 9.0, MARGIN, y - 13.0 * i as f32, line));
        }

        ops.push(fill_gray(0.5));
        ops.extend(text(
            FONT_REGULAR,
            8.0,
            MARGIN,
            MARGIN,
            &format!(
                "{}{}",
                FOOTER_PREFIX,
                format_timestamp(&self.metadata.generated_at)
            ),
        ));

        Content { operations: ops }
    }

    /// Add the page and its resources to `doc` under `parent`.
    ///
    /// The content stream is stored uncompressed; the signature image is
    /// Flate-compressed.
    pub fn append_to(&self, doc: &mut Document, parent: ObjectId) -> ComposeResult<ObjectId> {
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let image = embed_signature(doc, self.signature)?;

        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular,
                FONT_BOLD => bold,
            },
            "XObject" => dictionary! {
                SIGNATURE_XOBJECT => image,
            },
        });

        let mut content = Stream::new(dictionary! {}, self.content().encode()?);
        content.allows_compression = false;
        let content_id = doc.add_object(content);

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
            "Resources" => resources,
            "Contents" => content_id,
        }))
    }
}

fn deflate(data: &[u8]) -> ComposeResult<Vec<u8>> {
    let to_error = |e: std::io::Error| ComposeError::Serialize {
        reason: format!("image compression: {}", e),
    };
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(to_error)?;
    encoder.finish().map_err(to_error)
}

/// Embed the signature as an RGB image XObject, with a DeviceGray soft
/// mask when the source has an alpha channel.
fn embed_signature(doc: &mut Document, signature: &SignatureImage) -> ComposeResult<ObjectId> {
    let width = i64::from(signature.width);
    let height = i64::from(signature.height);

    let mut image = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = &signature.alpha {
        let mask = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(alpha)?,
        ));
        image.set("SMask", mask);
    }

    Ok(doc.add_object(Stream::new(image, deflate(&signature.rgb)?)))
}
