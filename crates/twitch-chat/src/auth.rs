//! App access token management for the Helix API.
//!
//! Tokens are obtained with the OAuth client-credentials grant and held in
//! an explicit [`AuthState`] owned by the metadata source. The token is
//! refreshed on demand right before a Helix call needs it.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::{Token, TwitchError};

/// Twitch OAuth token response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    token_type: String,
}

/// Twitch OAuth error response.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

/// Requests app access tokens for a registered client.
pub struct TwitchAuth {
    client_id: String,
    client_secret: String,
    token_url: String,
    http: reqwest::Client,
}

impl TwitchAuth {
    pub fn new(client_id: String, client_secret: String, token_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            token_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.token_url.clone(),
        )
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Request a fresh app access token.
    pub async fn request_app_token(&self) -> Result<Token, TwitchError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(TwitchError::AuthRequired);
        }

        tracing::info!("Requesting Twitch app access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let resp = self.http.post(&self.token_url).form(&params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(token_error(status.as_u16(), &body));
        }

        parse_token_body(&body, Utc::now().timestamp())
    }
}

fn token_error(status: u16, body: &str) -> TwitchError {
    let err: ErrorResponse = serde_json::from_str(body).unwrap_or(ErrorResponse {
        status: Some(status),
        message: Some(body.to_string()),
    });
    TwitchError::TokenRefreshFailed(format!(
        "{}: {}",
        err.status.unwrap_or(status),
        err.message.unwrap_or_default()
    ))
}

/// Parse a successful token endpoint body into a [`Token`].
fn parse_token_body(body: &str, now: i64) -> Result<Token, TwitchError> {
    let token_resp: TokenResponse = serde_json::from_str(body)
        .map_err(|e| TwitchError::TokenRefreshFailed(format!("failed to parse response: {e}")))?;

    if !token_resp.token_type.eq_ignore_ascii_case("bearer") {
        return Err(TwitchError::TokenRefreshFailed(format!(
            "unsupported token type {:?}",
            token_resp.token_type
        )));
    }

    Ok(Token {
        access_token: token_resp.access_token,
        token_type: "bearer".into(),
        expires_at: now + token_resp.expires_in,
    })
}

/// Whether `token` must be replaced at time `now` given a refresh margin.
fn needs_refresh(token: &Token, now: i64, margin: Duration) -> bool {
    let margin = i64::try_from(margin.as_secs()).unwrap_or(i64::MAX);
    now >= token.expires_at.saturating_sub(margin)
}

/// Current app token plus the means to renew it.
pub struct AuthState {
    auth: TwitchAuth,
    margin: Duration,
    current: Mutex<Option<Token>>,
}

impl AuthState {
    pub fn new(auth: TwitchAuth, margin: Duration) -> Self {
        Self {
            auth,
            margin,
            current: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(TwitchAuth::from_config(config), config.token_refresh_margin)
    }

    pub fn client_id(&self) -> &str {
        self.auth.client_id()
    }

    /// Return a valid token, requesting a new one if the cached token is
    /// missing or about to expire.
    pub async fn token(&self) -> Result<Token, TwitchError> {
        let mut current = self.current.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = current.as_ref() {
            if !needs_refresh(token, now, self.margin) {
                return Ok(token.clone());
            }
            tracing::info!(
                expires_in_secs = token.expires_at - now,
                "App token expiring soon, refreshing"
            );
        }

        let token = self.auth.request_app_token().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call requests a new one.
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: i64) -> Token {
        Token {
            access_token: "abc".into(),
            token_type: "bearer".into(),
            expires_at,
        }
    }

    #[test]
    fn test_parse_client_credentials_response() {
        let body = r#"{"access_token":"jostpf5q0uzmxmkba9iyug38kjtgh","expires_in":5011271,"token_type":"bearer"}"#;
        let parsed = parse_token_body(body, 1_000).unwrap();
        assert_eq!(parsed.access_token, "jostpf5q0uzmxmkba9iyug38kjtgh");
        assert_eq!(parsed.expires_at, 1_000 + 5_011_271);
    }

    #[test]
    fn test_non_bearer_token_rejected() {
        let body = r#"{"access_token":"x","expires_in":60,"token_type":"mac"}"#;
        assert!(matches!(
            parse_token_body(body, 0),
            Err(TwitchError::TokenRefreshFailed(_))
        ));
    }

    #[test]
    fn test_error_body_is_reported() {
        let err = token_error(400, r#"{"status":400,"message":"invalid client secret"}"#);
        assert!(err.to_string().contains("invalid client secret"));
        assert!(matches!(err, TwitchError::TokenRefreshFailed(_)));
    }

    #[test]
    fn test_refresh_margin() {
        let margin = Duration::from_secs(10);
        assert!(!needs_refresh(&token(1_000), 900, margin));
        assert!(needs_refresh(&token(1_000), 990, margin));
        assert!(needs_refresh(&token(1_000), 2_000, margin));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_fast() {
        let auth = TwitchAuth::new(String::new(), String::new(), "http://localhost".into());
        let result = auth.request_app_token().await;
        assert!(matches!(result, Err(TwitchError::AuthRequired)));
    }
}
