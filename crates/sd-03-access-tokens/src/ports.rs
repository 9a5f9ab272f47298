//! Port definition for token persistence.

use crate::domain::AccessToken;
use crate::error::TokenResult;
use async_trait::async_trait;
use shared_types::{DeliveryId, Timestamp};

/// Storage for issued access tokens.
///
/// `mark_used` and `revoke` only ever set a timestamp that is still empty;
/// they return the stored token after the update, or `None` when the token
/// does not exist.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a new token. Fails with `Duplicate` if the string is taken.
    async fn insert(&self, token: AccessToken) -> TokenResult<()>;

    async fn find(&self, token: &str) -> TokenResult<Option<AccessToken>>;

    /// Set `used_at` if it is not set yet.
    async fn mark_used(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>>;

    /// Set `revoked_at` if it is not set yet.
    async fn revoke(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>>;

    async fn list_for_delivery(&self, delivery_id: DeliveryId) -> TokenResult<Vec<AccessToken>>;
}
