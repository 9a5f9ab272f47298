//! Artifact Store Adapters
//!
//! Implementations of the `ArtifactStore` trait.

mod filesystem;
mod memory;

pub use filesystem::FileSystemArtifactStore;
pub use memory::InMemoryArtifactStore;
