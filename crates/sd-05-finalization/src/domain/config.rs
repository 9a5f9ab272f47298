//! Finalization configuration

use crate::error::{FinalizationError, FinalizationResult};
use chrono::Duration;

/// Finalization configuration
#[derive(Clone, Debug)]
pub struct FinalizationConfig {
    /// Lifetime of the pickup (QR) token
    pub pickup_token_ttl: Duration,
    /// Lifetime of the emailed token
    pub email_token_ttl: Duration,
    /// Age after which a held lock is considered abandoned and may be
    /// taken over. `None` never takes over.
    pub lock_ttl: Option<Duration>,
    /// Base URL used to build download links
    pub public_base_url: String,
}

impl Default for FinalizationConfig {
    fn default() -> Self {
        Self {
            pickup_token_ttl: Duration::hours(24),
            email_token_ttl: Duration::days(7),
            lock_ttl: Some(Duration::minutes(10)),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl FinalizationConfig {
    pub fn with_pickup_token_ttl(mut self, ttl: Duration) -> Self {
        self.pickup_token_ttl = ttl;
        self
    }

    pub fn with_email_token_ttl(mut self, ttl: Duration) -> Self {
        self.email_token_ttl = ttl;
        self
    }

    pub fn with_lock_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    pub fn validate(&self) -> FinalizationResult<()> {
        let invalid = |reason: &str| {
            Err(FinalizationError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.pickup_token_ttl <= Duration::zero() || self.email_token_ttl <= Duration::zero() {
            return invalid("token TTLs must be positive");
        }
        if self.pickup_token_ttl > self.email_token_ttl {
            return invalid("pickup token TTL exceeds email token TTL");
        }
        if matches!(self.lock_ttl, Some(ttl) if ttl <= Duration::zero()) {
            return invalid("lock TTL must be positive; use None to disable takeover");
        }
        if self.public_base_url.trim().is_empty() {
            return invalid("public base URL is empty");
        }
        Ok(())
    }

    /// Public download link for a token.
    pub fn download_url(&self, token: &str) -> String {
        format!(
            "{}/download/{}",
            self.public_base_url.trim_end_matches('/'),
            token
        )
    }
}
