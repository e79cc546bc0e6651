//! Scope-keyed token cache.
//!
//! Entries are keyed by the exact space-joined scope list: order matters and
//! nothing is normalised, so `["a", "b"]` and `["b", "a"]` are two entries.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::provider::{AccessToken, AuthProvider};
use crate::error::AuthError;

/// Cache key for a scope list
pub fn scope_key(scopes: &[String]) -> String {
    scopes.join(" ")
}

/// Owns access tokens per scope set and decides how to obtain missing ones
pub struct TokenCache {
    provider: Arc<dyn AuthProvider>,
    entries: RwLock<HashMap<String, AccessToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        TokenCache {
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return a bearer token for `scopes`.
    ///
    /// Order of attempts: cached unexpired entry, then silent acquisition
    /// against a bound account, then (only with `allow_interactive`) an
    /// interactive prompt. A failure never disturbs other entries.
    pub async fn acquire(
        &self,
        scopes: &[String],
        allow_interactive: bool,
    ) -> Result<String, AuthError> {
        let key = scope_key(scopes);
        if let Some(secret) = self.cached(&key).await {
            tracing::debug!(scope = %key, "Token cache hit");
            return Ok(secret);
        }

        let token = if self.provider.has_bound_account() {
            match self.provider.acquire_silent(scopes).await {
                Ok(token) => token,
                Err(reason) if allow_interactive => {
                    tracing::warn!(scope = %key, %reason, "Silent acquisition failed, prompting");
                    self.acquire_interactive(scopes).await?
                }
                Err(reason) => {
                    tracing::warn!(scope = %key, %reason, "Silent acquisition failed");
                    return Err(AuthError::Silent { reason });
                }
            }
        } else if allow_interactive {
            self.acquire_interactive(scopes).await?
        } else {
            tracing::info!(scope = %key, "No bound account; interactive sign-in required");
            return Err(AuthError::NoAccount);
        };

        let secret = token.secret.clone();
        // Concurrent misses for one key both land here; the last write wins.
        self.entries.write().await.insert(key.clone(), token);
        tracing::info!(scope = %key, "Token cached");
        Ok(secret)
    }

    async fn acquire_interactive(&self, scopes: &[String]) -> Result<AccessToken, AuthError> {
        self.provider
            .acquire_interactive(scopes)
            .await
            .map_err(|reason| AuthError::Interactive { reason })
    }

    async fn cached(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|token| !token.is_expired_at(Utc::now()))
            .map(|token| token.secret.clone())
    }

    /// Whether an unexpired token is cached for exactly these scopes
    pub async fn contains(&self, scopes: &[String]) -> bool {
        self.cached(&scope_key(scopes)).await.is_some()
    }

    /// Drop the entry for these scopes; returns whether one existed
    pub async fn invalidate(&self, scopes: &[String]) -> bool {
        self.entries.write().await.remove(&scope_key(scopes)).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of unexpired entries
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|token| !token.is_expired_at(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
