//! # Signed-Delivery Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Composition throughput
//! └── src/
//!     ├── fixtures.rs   # Runtime and record builders
//!     └── integration/  # Cross-crate finalization properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sd-tests
//! cargo test -p sd-tests integration::exactly_once
//! cargo bench -p sd-tests
//! ```

pub mod fixtures;
pub mod integration;
