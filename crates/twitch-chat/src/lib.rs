//! Twitch chat annotation client library.
//!
//! Turns raw chat lines into structured events whose text is split into
//! plain runs, emotes and cheers. Channel metadata (cheermote ladders and
//! badges) is fetched lazily from the Helix API and cached per channel.

pub mod auth;
pub mod badges;
pub mod cache;
pub mod cheer;
pub mod client;
pub mod config;
pub mod event;
pub mod helix;
pub mod irc;
pub mod metadata;
pub mod text;

pub use badges::{BadgeCatalog, BadgeImage};
pub use cache::ChannelMetadataCache;
pub use cheer::{CheerMatch, CheermoteCatalog, Tier, TierLadder};
pub use client::ChatClient;
pub use config::ClientConfig;
pub use event::{Event, EventKind, InboundLine, Viewer};
pub use metadata::{BadgeScope, MetadataSource};
pub use text::{AnnotatedMessage, Segment, SegmentBuilder};

use serde::{Deserialize, Serialize};

/// App access token obtained through the client-credentials grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: i64,
}

/// Unified error type for the twitch-chat crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: no client credentials configured")]
    AuthRequired,

    #[error("Token request failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Twitch API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed metadata: {0}")]
    Data(String),

    #[error("No such badge {key:?} in channel {channel:?} or global badges")]
    NoSuchBadge { channel: String, key: String },

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid emote spec: {0}")]
    InvalidEmoteSpec(String),

    #[error("Chat transport error: {0}")]
    Transport(String),

    #[error("Metadata request timed out")]
    Timeout,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
