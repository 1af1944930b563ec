//! Client configuration loaded from the environment.

use std::time::Duration;

use crate::TwitchError;

pub const DEFAULT_HELIX_BASE: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 24;
const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 10;

/// Runtime configuration for [`crate::ChatClient`] and its collaborators.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub helix_base: String,
    pub token_url: String,
    pub irc_url: String,
    /// Upper bound on a single metadata fetch (user lookup, cheermotes, badges).
    pub metadata_timeout: Duration,
    /// Capacity of the inbound line queue and the outbound event queue.
    pub event_queue_capacity: usize,
    /// Refresh the app token when it expires within this window.
    pub token_refresh_margin: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            helix_base: DEFAULT_HELIX_BASE.into(),
            token_url: DEFAULT_TOKEN_URL.into(),
            irc_url: DEFAULT_IRC_URL.into(),
            metadata_timeout: Duration::from_secs(DEFAULT_METADATA_TIMEOUT_SECS),
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            token_refresh_margin: Duration::from_secs(DEFAULT_TOKEN_REFRESH_MARGIN_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `.env` (if present) and process environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Missing or empty string keys keep their defaults; numeric keys that do
    /// not parse also keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> String { lookup(key).unwrap_or_default().trim().to_string() };
        let defaults = Self::default();

        let or_default = |value: String, default: String| {
            if value.is_empty() { default } else { value }
        };

        Self {
            client_id: g("TWITCH_CLIENT_ID"),
            client_secret: g("TWITCH_CLIENT_SECRET"),
            helix_base: or_default(g("TWITCH_HELIX_BASE"), defaults.helix_base),
            token_url: or_default(g("TWITCH_TOKEN_URL"), defaults.token_url),
            irc_url: or_default(g("TWITCH_IRC_URL"), defaults.irc_url),
            metadata_timeout: Duration::from_secs(parse_u64(
                &g("TWITCH_METADATA_TIMEOUT_SECS"),
                DEFAULT_METADATA_TIMEOUT_SECS,
            )),
            event_queue_capacity: parse_usize(
                &g("TWITCH_EVENT_QUEUE_CAPACITY"),
                DEFAULT_EVENT_QUEUE_CAPACITY,
            ),
            token_refresh_margin: defaults.token_refresh_margin,
        }
    }

    /// Whether app credentials for the metadata API are present.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Reject configurations that cannot reach the metadata API.
    pub fn validate(&self) -> Result<(), TwitchError> {
        if !self.has_credentials() {
            return Err(TwitchError::AuthRequired);
        }
        if self.event_queue_capacity == 0 {
            return Err(TwitchError::Data(
                "event queue capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_usize(s: &str, default: usize) -> usize {
    match s.parse::<usize>() {
        Ok(0) | Err(_) => default,
        Ok(n) => n,
    }
}
