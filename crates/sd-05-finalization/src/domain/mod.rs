//! Domain layer for the Finalization Coordinator
//!
//! - `config` - token lifetimes and lock policy
//! - `outcome` - `TryFinalize` results
//! - `transitions` - conditional record updates shared by every repository

pub mod config;
pub mod outcome;
pub mod transitions;

pub use config::FinalizationConfig;
pub use outcome::{FailureReason, FinalizationReport, TryFinalizeOutcome};
pub use transitions::{FinalizationCommit, LockAttempt};
