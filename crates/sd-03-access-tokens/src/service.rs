//! Access token issuing and validation.

use crate::domain::{generate_token, AccessToken, TokenKind, TokenValidation};
use crate::error::{TokenError, TokenResult};
use crate::ports::TokenStore;
use chrono::Duration;
use delivery_telemetry::{TOKENS_ISSUED, TOKEN_VALIDATIONS};
use shared_types::{Clock, DeliveryId, TenantId};
use std::sync::Arc;
use tracing::{debug, info};

/// Attempts before giving up on a colliding token string.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Mints and validates download tokens.
pub struct AccessTokenIssuer {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl AccessTokenIssuer {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Mint a token for `delivery_id` valid for `ttl` from now.
    pub async fn issue(
        &self,
        delivery_id: DeliveryId,
        tenant_id: TenantId,
        kind: TokenKind,
        ttl: Duration,
    ) -> TokenResult<AccessToken> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidTtl {
                seconds: ttl.num_seconds(),
            });
        }

        let now = self.clock.now();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let token = AccessToken {
                token: generate_token(),
                delivery_id,
                tenant_id,
                kind,
                created_at: now,
                expires_at: now + ttl,
                used_at: None,
                revoked_at: None,
            };
            match self.store.insert(token.clone()).await {
                Ok(()) => {
                    TOKENS_ISSUED.with_label_values(&[kind.as_str()]).inc();
                    info!(
                        delivery_id = %delivery_id,
                        kind = %kind,
                        expires_at = %token.expires_at,
                        "[sd-03] Access token issued"
                    );
                    return Ok(token);
                }
                Err(TokenError::Duplicate) if attempts < MAX_ISSUE_ATTEMPTS => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Check a token: not found, then revoked, then expired, then ok.
    pub async fn validate(&self, token: &str) -> TokenResult<TokenValidation> {
        let validation = match self.store.find(token).await? {
            None => TokenValidation::NotFound,
            Some(t) if t.is_revoked() => TokenValidation::Revoked,
            Some(t) if t.is_expired(self.clock.now()) => TokenValidation::Expired,
            Some(t) => TokenValidation::Valid(t),
        };
        let code = validation.code();
        TOKEN_VALIDATIONS.with_label_values(&[code.as_str()]).inc();
        debug!(code = %code, "[sd-03] Token validated");
        Ok(validation)
    }

    /// Validate and, on success, record the first download.
    ///
    /// The token stays valid for repeat downloads.
    pub async fn record_download(&self, token: &str) -> TokenResult<TokenValidation> {
        match self.validate(token).await? {
            TokenValidation::Valid(t) => {
                let updated = self.store.mark_used(&t.token, self.clock.now()).await?;
                Ok(updated.map_or(TokenValidation::NotFound, TokenValidation::Valid))
            }
            other => Ok(other),
        }
    }

    /// Revoke one token. Returns `None` when it does not exist.
    pub async fn revoke(&self, token: &str) -> TokenResult<Option<AccessToken>> {
        let revoked = self.store.revoke(token, self.clock.now()).await?;
        if let Some(t) = &revoked {
            info!(delivery_id = %t.delivery_id, kind = %t.kind, "[sd-03] Access token revoked");
        }
        Ok(revoked)
    }

    /// Revoke every token of a delivery. Returns the tokens revoked by
    /// this call.
    pub async fn revoke_all(&self, delivery_id: DeliveryId) -> TokenResult<Vec<AccessToken>> {
        let mut revoked = Vec::new();
        for t in self.store.list_for_delivery(delivery_id).await? {
            if t.is_revoked() {
                continue;
            }
            if let Some(updated) = self.store.revoke(&t.token, self.clock.now()).await? {
                revoked.push(updated);
            }
        }
        info!(delivery_id = %delivery_id, count = revoked.len(), "[sd-03] Delivery tokens revoked");
        Ok(revoked)
    }

    /// All tokens issued for a delivery, oldest first.
    pub async fn tokens_for(&self, delivery_id: DeliveryId) -> TokenResult<Vec<AccessToken>> {
        self.store.list_for_delivery(delivery_id).await
    }
}
