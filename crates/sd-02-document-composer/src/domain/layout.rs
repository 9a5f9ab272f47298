//! Certification page geometry and text helpers.

use chrono::{DateTime, Utc};

/// A4 portrait, in PDF points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

/// Bounding box the signature image is fitted into.
pub const SIGNATURE_MAX_WIDTH: f32 = 300.0;
pub const SIGNATURE_MAX_HEIGHT: f32 = 120.0;

/// Padding between the signature image and its frame.
pub const SIGNATURE_PADDING: f32 = 10.0;

pub const BANNER: &str = "CERTIFICATE OF SIGNED DELIVERY";
pub const DISCLAIMER_LINES: [&str; 2] = [
    "The pages preceding this certificate are the unaltered original document.",
    "The SHA-256 digest above identifies the original file exactly as received.",
];
pub const FOOTER_PREFIX: &str = "Generated by Signed Delivery - ";

/// Longest free-text value printed in the metadata block.
pub const MAX_VALUE_CHARS: usize = 64;

/// Scaled size of a `width` x `height` image inside the signature box.
///
/// Aspect ratio is preserved and the image is never upscaled.
pub fn fit_signature(width: u32, height: u32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (SIGNATURE_MAX_WIDTH / w)
        .min(SIGNATURE_MAX_HEIGHT / h)
        .min(1.0);
    (w * scale, h * scale)
}

/// Human-readable UTC timestamp printed on the page.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Encode text for a WinAnsiEncoding standard font.
///
/// Latin-1 printable characters map to themselves, control characters
/// become spaces and anything else becomes `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            0x00..=0x1F | 0x7F => b' ',
            _ => b'?',
        })
        .collect()
}

/// Clip a value to [`MAX_VALUE_CHARS`], marking the cut with `...`.
pub fn clip(value: &str) -> String {
    let value = value.trim();
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(MAX_VALUE_CHARS - 3).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_large_image_scaled_down_preserving_ratio() {
        let (w, h) = fit_signature(600, 200);
        assert!((w - 300.0).abs() < 0.01);
        assert!((h - 100.0).abs() < 0.01);

        let (w, h) = fit_signature(200, 480);
        assert!((h - 120.0).abs() < 0.01);
        assert!((w - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_small_image_not_upscaled() {
        assert_eq!(fit_signature(80, 40), (80.0, 40.0));
    }

    #[test]
    fn test_zero_sized_image() {
        assert_eq!(fit_signature(0, 10), (0.0, 0.0));
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_timestamp(&at), "2026-03-04 05:06:07 UTC");
    }

    #[test]
    fn test_win_ansi_replacement() {
        assert_eq!(win_ansi("Peña"), vec![b'P', b'e', 0xF1, b'a']);
        assert_eq!(win_ansi("Łódź"), b"?\xF3d?".to_vec());
        assert_eq!(win_ansi("a\tb"), b"a b".to_vec());
    }

    #[test]
    fn test_clip_long_values() {
        let long = "x".repeat(100);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MAX_VALUE_CHARS);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("  Acme  "), "Acme");
    }
}
