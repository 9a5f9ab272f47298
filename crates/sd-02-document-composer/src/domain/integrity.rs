//! Whole-file integrity hashing.
//!
//! The digest is taken over the exact bytes received, before any parsing,
//! so a stored original can be re-verified later by hashing it again.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Check `bytes` against a previously recorded digest. Comparison is
/// case-insensitive.
pub fn verify(bytes: &[u8], expected_hex: &str) -> bool {
    sha256_hex(bytes).eq_ignore_ascii_case(expected_hex.trim())
}
