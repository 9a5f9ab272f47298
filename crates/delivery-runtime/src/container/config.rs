//! # Runtime Configuration
//!
//! Unified configuration for the adapters, the finalization coordinator and
//! the upload limits.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SD_DATA_DIR` | `./data` | Root of records, artifacts, tokens and audit log |
//! | `SD_PICKUP_TOKEN_TTL_SECS` | `86400` | Pickup (QR) token lifetime |
//! | `SD_EMAIL_TOKEN_TTL_SECS` | `604800` | Emailed token lifetime |
//! | `SD_LOCK_TTL_SECS` | `600` | Stale finalization lock age, `0` disables takeover |
//! | `SD_PUBLIC_BASE_URL` | `http://localhost:3000` | Base of emailed download links |
//! | `SD_SWEEP_INTERVAL_SECS` | `60` | Retry sweeper period |
//! | `SD_MAX_SIGNATURE_BYTES` | `2097152` | Signature upload limit |
//! | `SD_MAX_ORIGINAL_BYTES` | `20971520` | Original document upload limit |

use sd_05_finalization::{FinalizationConfig, FinalizationError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// A value parses but is out of range.
    #[error("Invalid configuration: {reason}")]
    OutOfRange { reason: String },

    #[error(transparent)]
    Finalization(#[from] FinalizationError),
}

/// Upload size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_signature_bytes: usize,
    pub max_original_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_signature_bytes: 2 * 1024 * 1024,
            max_original_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub data_dir: PathBuf,
    pub finalization: FinalizationConfig,
    pub sweep_interval: Duration,
    pub limits: UploadLimits,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            finalization: FinalizationConfig::default(),
            sweep_interval: Duration::from_secs(60),
            limits: UploadLimits::default(),
        }
    }
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

fn seconds(secs: u64, var: &'static str) -> Result<chrono::Duration, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| ConfigError::InvalidValue {
            var,
            value: secs.to_string(),
        })
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Unset
    /// variables keep their defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("SD_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("SD_PICKUP_TOKEN_TTL_SECS") {
            let secs = parse("SD_PICKUP_TOKEN_TTL_SECS", v)?;
            config.finalization.pickup_token_ttl = seconds(secs, "SD_PICKUP_TOKEN_TTL_SECS")?;
        }
        if let Some(v) = lookup("SD_EMAIL_TOKEN_TTL_SECS") {
            let secs = parse("SD_EMAIL_TOKEN_TTL_SECS", v)?;
            config.finalization.email_token_ttl = seconds(secs, "SD_EMAIL_TOKEN_TTL_SECS")?;
        }
        if let Some(v) = lookup("SD_LOCK_TTL_SECS") {
            let secs: u64 = parse("SD_LOCK_TTL_SECS", v)?;
            config.finalization.lock_ttl = match secs {
                0 => None,
                secs => Some(seconds(secs, "SD_LOCK_TTL_SECS")?),
            };
        }
        if let Some(url) = lookup("SD_PUBLIC_BASE_URL") {
            config.finalization.public_base_url = url;
        }
        if let Some(v) = lookup("SD_SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Duration::from_secs(parse("SD_SWEEP_INTERVAL_SECS", v)?);
        }
        if let Some(v) = lookup("SD_MAX_SIGNATURE_BYTES") {
            config.limits.max_signature_bytes = parse("SD_MAX_SIGNATURE_BYTES", v)?;
        }
        if let Some(v) = lookup("SD_MAX_ORIGINAL_BYTES") {
            config.limits.max_original_bytes = parse("SD_MAX_ORIGINAL_BYTES", v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.finalization.validate()?;
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                reason: "sweep interval must be positive".to_string(),
            });
        }
        if self.limits.max_signature_bytes == 0 || self.limits.max_original_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                reason: "upload limits must be positive".to_string(),
            });
        }
        Ok(())
    }
}
