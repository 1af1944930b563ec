//! Lazily resolved, per-channel metadata.
//!
//! Every catalog is fetched at most once per channel for the lifetime of
//! the cache. Concurrent first requests for the same channel share one
//! fetch; a failed fetch is not remembered and the next request retries.


use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OnceCell, RwLock};

use crate::TwitchError;
use crate::badges::{BadgeCatalog, BadgeImage};
use crate::cheer::CheermoteCatalog;
use crate::metadata::{BadgeScope, MetadataSource};

const EMOTE_CDN_BASE: &str = "https://static-cdn.jtvnw.net/emoticons/v2";

/// Metadata known about one channel.
///
/// Each cell moves from unresolved to resolved exactly once; while a fetch
/// is in flight, other callers wait on the same cell.
#[derive(Debug)]
pub struct ChannelMetadata {
    login: String,
    broadcaster_id: OnceCell<String>,
    cheermotes: OnceCell<Arc<CheermoteCatalog>>,
    badges: OnceCell<Arc<BadgeCatalog>>,
}

impl ChannelMetadata {
    fn new(login: String) -> Self {
        Self {
            login,
            broadcaster_id: OnceCell::new(),
            cheermotes: OnceCell::new(),
            badges: OnceCell::new(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn broadcaster_id(&self) -> Option<&str> {
        self.broadcaster_id.get().map(String::as_str)
    }

    pub fn cheermotes(&self) -> Option<Arc<CheermoteCatalog>> {
        self.cheermotes.get().cloned()
    }

    pub fn badges(&self) -> Option<Arc<BadgeCatalog>> {
        self.badges.get().cloned()
    }
}

/// Owner of all [`ChannelMetadata`] plus the shared global badge catalog.
pub struct ChannelMetadataCache<S> {
    source: S,
    fetch_timeout: Duration,
    channels: RwLock<HashMap<String, Arc<ChannelMetadata>>>,
    global_badges: OnceCell<Arc<BadgeCatalog>>,
}

impl<S: MetadataSource> ChannelMetadataCache<S> {
    pub fn new(source: S, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
            channels: RwLock::new(HashMap::new()),
            global_badges: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Entry for a channel, created on first reference.
    pub async fn channel(&self, name: &str) -> Arc<ChannelMetadata> {
        let login = normalize_channel(name);
        if let Some(entry) = self.channels.read().await.get(&login) {
            return entry.clone();
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(login.clone())
            .or_insert_with(|| {
                tracing::debug!(channel = %login, "Tracking new channel");
                Arc::new(ChannelMetadata::new(login.clone()))
            })
            .clone()
    }

    /// Logins of every channel referenced so far.
    pub async fn channels(&self) -> Vec<String> {
        let mut logins: Vec<String> = self.channels.read().await.keys().cloned().collect();
        logins.sort();
        logins
    }

    pub async fn broadcaster_id(&self, channel: &str) -> Result<String, TwitchError> {
        let entry = self.channel(channel).await;
        self.resolve_broadcaster_id(&entry).await.map(str::to_string)
    }

    /// Cheermote catalog for a channel, fetched on first use.
    pub async fn get_cheermote_catalog(
        &self,
        channel: &str,
    ) -> Result<Arc<CheermoteCatalog>, TwitchError> {
        let entry = self.channel(channel).await;
        let catalog = entry
            .cheermotes
            .get_or_try_init(|| async {
                let broadcaster_id = self.resolve_broadcaster_id(&entry).await?;
                let definitions = self
                    .bounded(self.source.fetch_cheermotes(broadcaster_id))
                    .await?;
                let catalog = CheermoteCatalog::build(&definitions)?;
                tracing::info!(
                    channel = %entry.login,
                    prefixes = catalog.len(),
                    "Cheermote catalog resolved"
                );
                Ok::<_, TwitchError>(Arc::new(catalog))
            })
            .await?;
        Ok(catalog.clone())
    }

    /// Catalog for a channel if it has already been resolved.
    pub async fn cached_cheermote_catalog(&self, channel: &str) -> Option<Arc<CheermoteCatalog>> {
        let login = normalize_channel(channel);
        self.channels.read().await.get(&login)?.cheermotes()
    }

    /// Image URL for an emote or cheer tier ID.
    ///
    /// Cheer tiers resolve only once the channel's catalog is loaded; any
    /// other ID is treated as a Twitch emote.
    pub async fn emote_url(&self, channel: &str, emote_id: &str) -> String {
        if let Some(catalog) = self.cached_cheermote_catalog(channel).await {
            if let Some(url) = catalog.image_url(emote_id) {
                return url.to_string();
            }
        }
        format!("{EMOTE_CDN_BASE}/{emote_id}/default/dark/1.0")
    }

    /// Badge image for `key` (`set/version`), channel badges first.
    pub async fn get_badge(&self, channel: &str, key: &str) -> Result<BadgeImage, TwitchError> {
        let entry = self.channel(channel).await;

        let channel_badges = entry
            .badges
            .get_or_try_init(|| async {
                let broadcaster_id = self.resolve_broadcaster_id(&entry).await?;
                let sets = self
                    .bounded(self.source.fetch_badges(BadgeScope::Channel(broadcaster_id)))
                    .await?;
                let catalog = BadgeCatalog::build(&sets)?;
                tracing::info!(channel = %entry.login, count = catalog.len(), "Channel badges resolved");
                Ok::<_, TwitchError>(Arc::new(catalog))
            })
            .await?;
        if let Some(badge) = channel_badges.get(key) {
            return Ok(badge.clone());
        }

        let global_badges = self
            .global_badges
            .get_or_try_init(|| async {
                let sets = self.bounded(self.source.fetch_badges(BadgeScope::Global)).await?;
                let catalog = BadgeCatalog::build(&sets)?;
                tracing::info!(count = catalog.len(), "Global badges resolved");
                Ok::<_, TwitchError>(Arc::new(catalog))
            })
            .await?;
        global_badges
            .get(key)
            .cloned()
            .ok_or_else(|| TwitchError::NoSuchBadge {
                channel: entry.login.clone(),
                key: key.to_string(),
            })
    }

    pub async fn get_badge_url(&self, channel: &str, key: &str) -> Result<String, TwitchError> {
        self.get_badge(channel, key).await.map(|badge| badge.url)
    }

    async fn resolve_broadcaster_id<'a>(
        &self,
        entry: &'a ChannelMetadata,
    ) -> Result<&'a str, TwitchError> {
        let id = entry
            .broadcaster_id
            .get_or_try_init(|| self.bounded(self.source.fetch_broadcaster_id(&entry.login)))
            .await?;
        Ok(id.as_str())
    }

    /// Run a remote call under the fetch timeout. Expiry drops the call.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, TwitchError>>,
    ) -> Result<T, TwitchError> {
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Metadata request timed out"
                );
                Err(TwitchError::Timeout)
            }
        }
    }
}

/// `#Channel` and `channel` name the same entry.
fn normalize_channel(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}
