//! Chat badge catalogs.
//!
//! A badge key is `<set_id>/<version>` as sent in the `badges` chat tag,
//! e.g. `subscriber/12` or `moderator/1`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::TwitchError;
use crate::metadata::BadgeSetData;

/// Image URLs for one badge version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeImage {
    pub set_id: String,
    pub version: String,
    /// Smallest (`1x`) image.
    pub url: String,
    pub urls_by_size: BTreeMap<String, String>,
}

/// Badge key -> image mapping for the global scope or a single channel.
#[derive(Debug, Clone, Default)]
pub struct BadgeCatalog {
    badges: HashMap<String, BadgeImage>,
}

impl BadgeCatalog {
    pub fn build(sets: &[BadgeSetData]) -> Result<Self, TwitchError> {
        let mut badges = HashMap::new();

        for set in sets {
            for version in &set.versions {
                let url = version
                    .image_urls
                    .get("1x")
                    .filter(|u| !u.is_empty())
                    .cloned()
                    .ok_or_else(|| {
                        TwitchError::Data(format!(
                            "badge {}/{} has no 1x image",
                            set.set_id, version.id
                        ))
                    })?;

                badges.insert(
                    format!("{}/{}", set.set_id, version.id),
                    BadgeImage {
                        set_id: set.set_id.clone(),
                        version: version.id.clone(),
                        url,
                        urls_by_size: version.image_urls.clone(),
                    },
                );
            }
        }

        Ok(Self { badges })
    }

    pub fn get(&self, key: &str) -> Option<&BadgeImage> {
        self.badges.get(key)
    }

    pub fn url(&self, key: &str) -> Option<&str> {
        self.get(key).map(|b| b.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}
