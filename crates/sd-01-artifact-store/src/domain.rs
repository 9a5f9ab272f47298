//! Artifact path validation.
//!
//! Paths are relative, `/`-separated and may not leave their namespace.

use crate::error::{ArtifactError, ArtifactResult};

/// Maximum accepted path length in bytes.
pub const MAX_PATH_LEN: usize = 512;

/// Validate a namespace-relative artifact path.
pub fn validate_path(path: &str) -> ArtifactResult<()> {
    let invalid = |reason| ArtifactError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(invalid("path too long"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(invalid("forbidden character"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("empty segment")),
            "." | ".." => return Err(invalid("relative segment")),
            _ => {}
        }
    }
    Ok(())
}
