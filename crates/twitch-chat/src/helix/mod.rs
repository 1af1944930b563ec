//! Twitch Helix REST client for channel metadata.
//!
//! Covers the endpoints the annotation pipeline needs: user lookup,
//! cheermotes, and chat badges. Requests carry a Bearer token and the
//! Client-Id header.

mod badges;
mod cheermotes;
mod request;
mod source;
mod users;

pub mod models;

pub use source::HelixMetadataSource;

use url::Url;

use crate::{Token, TwitchError};

/// Twitch Helix API client with auth header injection.
pub struct HelixClient {
    pub(super) http: reqwest::Client,
    pub(super) client_id: String,
    pub(super) base: String,
}

impl HelixClient {
    pub fn new(client_id: String, base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Build an endpoint URL with encoded query parameters.
    pub(super) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TwitchError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        if query.is_empty() {
            return Ok(Url::parse(&url)?);
        }
        Ok(Url::parse_with_params(&url, query)?)
    }
}
