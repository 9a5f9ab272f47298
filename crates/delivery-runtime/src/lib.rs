//! # Delivery Runtime Library
//!
//! Wires the Signed-Delivery subsystems into a running service. The
//! `signed-delivery` binary in `main.rs` is the entry point.
//!
//! ## Modules
//!
//! - `container/` - Configuration and the adapter container
//! - `handlers/` - Artifact upload, download and token handlers
//! - `sweeper` - Periodic finalization retry
//!
//! ## Request Flow
//!
//! ```text
//! signature upload ─┐                      ┌─→ tokens ─→ download/info
//!                   ├─→ FinalizationCoordinator
//! original upload ──┘          ▲           └─→ audit, notification
//!                              │
//!                        RetrySweeper
//! ```

pub mod container;
pub mod error;
pub mod handlers;
pub mod sweeper;

pub use container::{
    ConfigError, ContainerError, ContainerParts, DeliveryRuntime, RuntimeConfig, UploadLimits,
};
pub use error::{HandlerError, HandlerResult};
pub use handlers::{DeliverySummary, DownloadHandlers, DownloadResponse, UploadHandlers, UploadReceipt};
pub use sweeper::{RetrySweeper, SweepReport};
