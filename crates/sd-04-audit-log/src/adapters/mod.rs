//! Audit sink adapters

pub mod json_lines;
pub mod memory;

pub use json_lines::JsonLinesAuditLog;
pub use memory::InMemoryAuditLog;
