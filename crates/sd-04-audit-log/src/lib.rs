//! # Audit Log (sd-04)
//!
//! Append-only trail of delivery events. Events are immutable once written
//! and the port exposes no update or delete.
//!
//! ## Event Types
//!
//! | Event | Actor | Emitted by |
//! |-------|-------|------------|
//! | `finalization_started` | system | coordinator, lock acquired |
//! | `finalized` | system | coordinator, success |
//! | `finalization_failed` | system | coordinator, failure after lock |
//! | `signature_uploaded` | client | signature upload handler |
//! | `original_uploaded` | employee | document upload handler |
//! | `document_downloaded` | client | download handler |
//! | `token_revoked` | employee | token revocation |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{InMemoryAuditLog, JsonLinesAuditLog};
pub use domain::{AuditEvent, AuditPayload};
pub use error::{AuditError, AuditResult};
pub use ports::AuditLog;
