//! Token store adapters

pub mod file;
pub mod memory;

pub use file::JsonFileTokenStore;
pub use memory::InMemoryTokenStore;
