//! Microsoft identity platform provider using the OAuth2 device authorization grant.
//!
//! Interactive acquisition asks the user to enter a code at a verification
//! URL (no browser or redirect listener involved). The refresh token from that
//! grant is the "bound account" that later silent acquisitions redeem.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::time::Instant;

use super::provider::{AccessToken, AuthFuture, AuthProvider};
use crate::network::client::create_client;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const OFFLINE_ACCESS: &str = "offline_access";

/// What the user must do to finish an interactive sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodePrompt {
    pub user_code: String,
    pub verification_uri: String,
    /// Ready-to-display instructions from the identity service
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn describe(&self) -> String {
        match &self.error_description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error.clone(),
        }
    }
}

enum TokenReply {
    Issued(TokenResponse),
    Rejected(TokenErrorResponse),
}

type Notifier = Box<dyn Fn(&DeviceCodePrompt) + Send + Sync>;

pub struct DeviceCodeProvider {
    http: reqwest::Client,
    authority: String,
    client_id: String,
    refresh_token: Mutex<Option<String>>,
    notify: Notifier,
}

impl DeviceCodeProvider {
    /// `notify` is called once per interactive sign-in with the code to show the user.
    pub fn new(
        authority: impl Into<String>,
        client_id: impl Into<String>,
        timeout: Duration,
        notify: impl Fn(&DeviceCodePrompt) + Send + Sync + 'static,
    ) -> Self {
        let authority: String = authority.into();
        DeviceCodeProvider {
            http: create_client(timeout),
            authority: authority.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            refresh_token: Mutex::new(None),
            notify: Box::new(notify),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/oauth2/v2.0/{}", self.authority, name)
    }

    fn stored_refresh_token(&self) -> Option<String> {
        self.refresh_token.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_refresh_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.refresh_token.lock() {
            *guard = token;
        }
    }

    /// Requested scopes plus `offline_access`, so a refresh token is issued
    fn scope_param(scopes: &[String]) -> String {
        let mut all: Vec<&str> = scopes.iter().map(String::as_str).collect();
        if !all.contains(&OFFLINE_ACCESS) {
            all.push(OFFLINE_ACCESS);
        }
        all.join(" ")
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<(reqwest::StatusCode, String), String> {
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| format!("Failed to encode form: {}", e))?;
        let response = self
            .http
            .post(url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| format!("Identity service unreachable: {}", e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Error reading identity service reply: {}", e))?;
        Ok((status, text))
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenReply, String> {
        let (status, text) = self.post_form(&self.endpoint("token"), params).await?;
        if status.is_success() {
            return serde_json::from_str(&text)
                .map(TokenReply::Issued)
                .map_err(|e| format!("Unexpected token response: {}", e));
        }
        match serde_json::from_str::<TokenErrorResponse>(&text) {
            Ok(error) => Ok(TokenReply::Rejected(error)),
            Err(_) => Err(format!("Token endpoint returned {}: {}", status, text)),
        }
    }

    /// Keep the refresh token for later silent use and wrap the access token
    fn bind(&self, issued: TokenResponse) -> AccessToken {
        if let Some(refresh) = issued.refresh_token {
            self.set_refresh_token(Some(refresh));
        }
        match issued.expires_in {
            Some(secs) => AccessToken::new(
                issued.access_token,
                Some(Utc::now() + chrono::Duration::seconds(secs)),
            ),
            None => AccessToken::from_secret(issued.access_token),
        }
    }

    async fn device_flow(&self, scopes: &[String]) -> Result<AccessToken, String> {
        let scope = Self::scope_param(scopes);
        let (status, text) = self
            .post_form(
                &self.endpoint("devicecode"),
                &[("client_id", self.client_id.as_str()), ("scope", scope.as_str())],
            )
            .await?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(error) => error.describe(),
                Err(_) => format!("Device code request returned {}: {}", status, text),
            });
        }
        let code: DeviceCodeResponse = serde_json::from_str(&text)
            .map_err(|e| format!("Unexpected device code response: {}", e))?;

        let prompt = DeviceCodePrompt {
            message: code.message.clone().unwrap_or_else(|| {
                format!("Open {} and enter the code {}", code.verification_uri, code.user_code)
            }),
            user_code: code.user_code,
            verification_uri: code.verification_uri,
        };
        tracing::info!(uri = %prompt.verification_uri, "Waiting for device code sign-in");
        (self.notify)(&prompt);

        let deadline = Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = code.interval.unwrap_or(5);
        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if Instant::now() >= deadline {
                return Err(String::from("device code expired before sign-in completed"));
            }
            let reply = self
                .token_request(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", code.device_code.as_str()),
                ])
                .await?;
            match reply {
                TokenReply::Issued(issued) => return Ok(self.bind(issued)),
                TokenReply::Rejected(error) => match error.error.as_str() {
                    "authorization_pending" => {}
                    "slow_down" => interval += 5,
                    _ => return Err(error.describe()),
                },
            }
        }
    }

    async fn refresh(&self, scopes: &[String]) -> Result<AccessToken, String> {
        let refresh_token = self
            .stored_refresh_token()
            .ok_or_else(|| String::from("no signed-in account"))?;
        let scope = Self::scope_param(scopes);
        let reply = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("scope", scope.as_str()),
            ])
            .await?;
        match reply {
            TokenReply::Issued(issued) => Ok(self.bind(issued)),
            TokenReply::Rejected(error) => {
                if error.error == "invalid_grant" {
                    // Revoked or expired refresh token: the account is no longer bound.
                    self.set_refresh_token(None);
                }
                Err(error.describe())
            }
        }
    }
}

impl AuthProvider for DeviceCodeProvider {
    fn has_bound_account(&self) -> bool {
        self.stored_refresh_token().is_some()
    }

    fn acquire_silent<'a>(&'a self, scopes: &'a [String]) -> AuthFuture<'a> {
        Box::pin(self.refresh(scopes))
    }

    fn acquire_interactive<'a>(&'a self, scopes: &'a [String]) -> AuthFuture<'a> {
        Box::pin(self.device_flow(scopes))
    }
}
