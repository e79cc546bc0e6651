//! Authentication provider trait and types.

use std::fmt;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use super::jwt;

/// Provider outcome: a token, or the reason the provider gave for failing
pub type AuthFuture<'a> = BoxFuture<'a, Result<AccessToken, String>>;

/// An identity service the token cache can ask for tokens.
///
/// Implementations own the protocol details (client registration, grant
/// types, user prompts). The cache owns the policy of when to call which.
pub trait AuthProvider: Send + Sync {
    /// Whether an account is signed in that silent acquisition can use
    fn has_bound_account(&self) -> bool;

    /// Get a token for `scopes` without involving the user.
    fn acquire_silent<'a>(&'a self, scopes: &'a [String]) -> AuthFuture<'a>;

    /// Get a token for `scopes` through a user-facing prompt.
    ///
    /// May wait on the user for an unbounded time.
    fn acquire_interactive<'a>(&'a self, scopes: &'a [String]) -> AuthFuture<'a>;
}

/// A bearer token and the moment it stops being usable
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        AccessToken {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Token whose expiry is read from its JWT `exp` claim, when it has one
    pub fn from_secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        let expires_at = jwt::expiry(&secret);
        AccessToken { secret, expires_at }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Serves one preconfigured bearer token for every scope
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenProvider {
            token: AccessToken::from_secret(token),
        }
    }

    fn serve(&self) -> Result<AccessToken, String> {
        if self.token.is_expired_at(Utc::now()) {
            return Err(String::from("configured token has expired"));
        }
        Ok(self.token.clone())
    }
}

impl AuthProvider for StaticTokenProvider {
    fn has_bound_account(&self) -> bool {
        true
    }

    fn acquire_silent<'a>(&'a self, _scopes: &'a [String]) -> AuthFuture<'a> {
        Box::pin(async move { self.serve() })
    }

    fn acquire_interactive<'a>(&'a self, _scopes: &'a [String]) -> AuthFuture<'a> {
        Box::pin(async move { self.serve() })
    }
}
