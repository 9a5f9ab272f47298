//! # Access Tokens (sd-03)
//!
//! Opaque, time-boxed, revocable credentials granting download of a final
//! document.
//!
//! | Kind | Default TTL | Delivered as |
//! |------|-------------|--------------|
//! | `pickup` | 24 hours | QR code shown at handoff |
//! | `email` | 7 days | Link in the delivery email |
//!
//! ## Validation Order
//!
//! `NOT_FOUND` → `REVOKED` → `EXPIRED` → `OK`
//!
//! A download sets `used_at` on first use only and never invalidates the
//! token.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryTokenStore, JsonFileTokenStore};
pub use domain::{generate_token, AccessToken, TokenKind, TokenValidation, ValidationCode};
pub use error::{TokenError, TokenResult};
pub use ports::TokenStore;
pub use service::AccessTokenIssuer;
