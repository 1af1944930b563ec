//! Channel metadata as delivered by a metadata source.
//!
//! These are the unvalidated shapes a source hands over; catalogs in
//! [`crate::cheer`] and [`crate::badges`] validate them at build time.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::TwitchError;

/// One bit threshold of a cheermote as reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheermoteTierData {
    pub min_bits: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// All tiers for a single cheermote prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheermoteDefinition {
    pub prefix: String,
    pub tiers: Vec<CheermoteTierData>,
}

/// One version of a badge set, with image URLs keyed by size (`1x`, `2x`, `4x`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeVersionData {
    pub id: String,
    pub image_urls: BTreeMap<String, String>,
}

/// A badge set and its versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeSetData {
    pub set_id: String,
    pub versions: Vec<BadgeVersionData>,
}

/// Which badge catalog to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeScope<'a> {
    Global,
    Channel(&'a str),
}

/// Remote collaborator that supplies channel metadata.
///
/// Every call may fail with a remote error; callers decide whether to retry.
pub trait MetadataSource: Send + Sync {
    /// Resolve a channel login to its broadcaster ID.
    fn fetch_broadcaster_id(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<String, TwitchError>> + Send;

    /// Fetch the cheermotes usable in a channel (global ones included).
    fn fetch_cheermotes(
        &self,
        broadcaster_id: &str,
    ) -> impl Future<Output = Result<Vec<CheermoteDefinition>, TwitchError>> + Send;

    /// Fetch global or channel-scoped chat badges.
    fn fetch_badges(
        &self,
        scope: BadgeScope<'_>,
    ) -> impl Future<Output = Result<Vec<BadgeSetData>, TwitchError>> + Send;
}
