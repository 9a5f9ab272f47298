//! Adapters for the Finalization Coordinator
//!
//! - `memory_repository` - single-process repository
//! - `file_repository` - one JSON file per record, `fs2` locked
//! - `notifier` - notification channel adapters

pub mod file_repository;
pub mod memory_repository;
pub mod notifier;

pub use file_repository::FileDeliveryRepository;
pub use memory_repository::InMemoryDeliveryRepository;
pub use notifier::{RecordingNotifier, TracingNotifier};
