//! Access token domain types.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use shared_types::{DeliveryId, TenantId, Timestamp};
use std::fmt;

/// Random bytes per token before hex encoding.
pub const TOKEN_BYTES: usize = 32;

/// Purpose of an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, shown as a QR code at handoff.
    Pickup,
    /// Long-lived, sent in the delivery email.
    Email,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Pickup => "pickup",
            TokenKind::Email => "email",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A download credential bound to one delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub delivery_id: DeliveryId,
    pub tenant_id: TenantId,
    pub kind: TokenKind,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// First successful download. Does not invalidate the token.
    pub used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

impl AccessToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Opaque, high-entropy token string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Outcome of validating a token string.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValidation {
    Valid(AccessToken),
    NotFound,
    Revoked,
    Expired,
}

impl TokenValidation {
    pub fn code(&self) -> ValidationCode {
        match self {
            TokenValidation::Valid(_) => ValidationCode::Ok,
            TokenValidation::NotFound => ValidationCode::NotFound,
            TokenValidation::Revoked => ValidationCode::Revoked,
            TokenValidation::Expired => ValidationCode::Expired,
        }
    }

    pub fn into_valid(self) -> Option<AccessToken> {
        match self {
            TokenValidation::Valid(token) => Some(token),
            _ => None,
        }
    }
}

/// Caller-visible validation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    Ok,
    NotFound,
    Revoked,
    Expired,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::Ok => "OK",
            ValidationCode::NotFound => "NOT_FOUND",
            ValidationCode::Revoked => "REVOKED",
            ValidationCode::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
