use crate::domain::AccessToken;
use crate::error::{TokenError, TokenResult};
use crate::ports::TokenStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{DeliveryId, Timestamp};
use std::collections::HashMap;

/// In-memory token store.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, AccessToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

/// Apply a set-once timestamp update to a token map.
pub(crate) fn set_once(
    tokens: &mut HashMap<String, AccessToken>,
    token: &str,
    update: impl FnOnce(&mut AccessToken),
) -> Option<AccessToken> {
    let entry = tokens.get_mut(token)?;
    update(entry);
    Some(entry.clone())
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, token: AccessToken) -> TokenResult<()> {
        let mut tokens = self.tokens.write();
        if tokens.contains_key(&token.token) {
            return Err(TokenError::Duplicate);
        }
        tokens.insert(token.token.clone(), token);
        Ok(())
    }

    async fn find(&self, token: &str) -> TokenResult<Option<AccessToken>> {
        Ok(self.tokens.read().get(token).cloned())
    }

    async fn mark_used(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>> {
        Ok(set_once(&mut self.tokens.write(), token, |t| {
            t.used_at.get_or_insert(at);
        }))
    }

    async fn revoke(&self, token: &str, at: Timestamp) -> TokenResult<Option<AccessToken>> {
        Ok(set_once(&mut self.tokens.write(), token, |t| {
            t.revoked_at.get_or_insert(at);
        }))
    }

    async fn list_for_delivery(&self, delivery_id: DeliveryId) -> TokenResult<Vec<AccessToken>> {
        let mut tokens: Vec<_> = self
            .tokens
            .read()
            .values()
            .filter(|t| t.delivery_id == delivery_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        Ok(tokens)
    }
}
