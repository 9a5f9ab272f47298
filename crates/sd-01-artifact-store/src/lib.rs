//! # Artifact Store (sd-01)
//!
//! Blob storage for the three artifact namespaces of a delivery:
//!
//! | Namespace | Content | Written by |
//! |-----------|---------|------------|
//! | `signature` | PNG/JPEG signature image | signature upload handler |
//! | `original` | Original commercial document (PDF) | document upload handler |
//! | `final` | Composed, certified document (PDF) | finalization coordinator |
//!
//! Paths are partitioned by tenant and delivery
//! (`{tenant}/{delivery}/{file}`, see [`shared_types::ArtifactRef`]).
//!
//! ## Create-If-Absent
//!
//! `put` never overwrites. A second put to the same reference fails with
//! [`ArtifactError::AlreadyExists`]; callers check existing references
//! before uploading.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `ports` - The `ArtifactStore` trait
//! - `adapters/` - In-memory and filesystem implementations
//! - `domain` - Path validation

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{FileSystemArtifactStore, InMemoryArtifactStore};
pub use error::{ArtifactError, ArtifactResult};
pub use ports::ArtifactStore;
