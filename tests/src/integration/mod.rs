//! # Integration Tests
//!
//! - `exactly_once` - concurrent triggers, in one process and across
//!   runtimes sharing storage
//! - `lifecycle` - readiness gate, re-entry, failure release and retry
//! - `composition` - page-count law, hash fidelity, the three-page scenario
//! - `delivery` - tokens, downloads, notification and the audit trail

pub mod composition;
pub mod delivery;
pub mod exactly_once;
pub mod lifecycle;
