//! # Delivery Telemetry
//!
//! Observability for the Signed-Delivery services.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and either
//!   a human-readable or a JSON formatting layer.
//! - **Metrics**: Prometheus counters and histograms for finalization
//!   outcomes, composition latency and token activity.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use delivery_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SD_SERVICE_NAME` | `signed-delivery` | Service name attached to logs |
//! | `SD_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SD_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `SD_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, COMPOSE_DURATION,
    FINALIZE_OUTCOMES, TOKENS_ISSUED, TOKEN_VALIDATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first: registration is synchronous and cannot race with logging
    let metrics_handle = register_metrics()?;
    let logging_handle = init_logging(config)?;

    Ok(TelemetryGuard {
        _logging: logging_handle,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span carrying the delivery identifier.
///
/// ```rust,ignore
/// let _span = delivery_span!("try_finalize", delivery_id = %id).entered();
/// ```
#[macro_export]
macro_rules! delivery_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
