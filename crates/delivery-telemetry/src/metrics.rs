//! Prometheus metrics for Signed-Delivery subsystems.
//!
//! All metrics follow the naming convention: `sd_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // FINALIZATION METRICS (sd-05)
    // =========================================================================

    /// TryFinalize outcomes
    pub static ref FINALIZE_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("sd_finalize_outcomes_total", "TryFinalize calls by outcome"),
        &["outcome"]  // finalized/already_finalized/not_ready/lock_held/failed
    ).expect("metric creation failed");

    // =========================================================================
    // COMPOSER METRICS (sd-02)
    // =========================================================================

    /// Document composition duration
    pub static ref COMPOSE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "sd_compose_duration_seconds",
            "Time spent composing final documents"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // TOKEN METRICS (sd-03)
    // =========================================================================

    /// Access tokens issued
    pub static ref TOKENS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("sd_tokens_issued_total", "Access tokens issued"),
        &["kind"]  // pickup/email
    ).expect("metric creation failed");

    /// Access token validations
    pub static ref TOKEN_VALIDATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("sd_token_validations_total", "Access token validations by result code"),
        &["code"]  // OK/NOT_FOUND/REVOKED/EXPIRED
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error: the second call returns a handle to
/// the already populated registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FINALIZE_OUTCOMES.clone()),
        Box::new(COMPOSE_DURATION.clone()),
        Box::new(TOKENS_ISSUED.clone()),
        Box::new(TOKEN_VALIDATIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
