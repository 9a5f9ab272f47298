//! # Shared Types Crate
//!
//! Domain entities shared by every Signed-Delivery subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the `DeliveryRecord` aggregate and its
//!   identifiers are defined here and nowhere else.
//! - **Set-once pointers**: artifact references are written at most once and
//!   never cleared; only the finalization subsystem moves a record to
//!   `FINALIZED`.
//! - **Injected time**: subsystems read time through the [`Clock`] port so
//!   expiry and lock-age logic is testable.

pub mod clock;
pub mod entities;
pub mod errors;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::*;
pub use errors::*;
