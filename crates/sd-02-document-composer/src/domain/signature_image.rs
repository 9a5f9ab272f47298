//! Signature image decoding.
//!
//! PNG and JPEG are accepted. The image is flattened to 8-bit RGB samples
//! plus an optional 8-bit alpha plane, which becomes the soft mask of the
//! embedded image XObject.

use crate::error::{ComposeError, ComposeResult};
use image::{GenericImageView, ImageFormat};

/// Largest accepted edge, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// Source format of a signature image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFormat {
    Png,
    Jpeg,
}

impl SignatureFormat {
    /// Sniff the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(SignatureFormat::Png),
            ImageFormat::Jpeg => Some(SignatureFormat::Jpeg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SignatureFormat::Png => "png",
            SignatureFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SignatureFormat::Png => "image/png",
            SignatureFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Decoded signature pixels.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB samples, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
    /// Row-major alpha samples, present only for images with an alpha channel.
    pub alpha: Option<Vec<u8>>,
}

impl SignatureImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> ComposeResult<Self> {
        let format = SignatureFormat::detect(bytes).ok_or_else(|| ComposeError::InvalidSignature {
            reason: "expected PNG or JPEG data".to_string(),
        })?;

        let format = match format {
            SignatureFormat::Png => ImageFormat::Png,
            SignatureFormat::Jpeg => ImageFormat::Jpeg,
        };
        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
            ComposeError::InvalidSignature {
                reason: e.to_string(),
            }
        })?;

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ComposeError::InvalidSignature {
                reason: "image has no pixels".to_string(),
            });
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ComposeError::InvalidSignature {
                reason: format!(
                    "image is {}x{}, limit is {}x{}",
                    width, height, MAX_DIMENSION, MAX_DIMENSION
                ),
            });
        }

        if decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8().into_raw();
            let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(rgba.len() / 4);
            for px in rgba.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            Ok(Self {
                width,
                height,
                rgb,
                alpha: Some(alpha),
            })
        } else {
            Ok(Self {
                width,
                height,
                rgb: decoded.to_rgb8().into_raw(),
                alpha: None,
            })
        }
    }
}
