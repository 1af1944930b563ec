use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::metadata::{BadgeSetData, BadgeVersionData, CheermoteDefinition, CheermoteTierData};

/// Wrapper for Twitch Helix list responses.
#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

/// User information from GET /helix/users.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
}

/// Cheermote from GET /helix/bits/cheermotes.
#[derive(Debug, Clone, Deserialize)]
pub struct HelixCheermote {
    pub prefix: String,
    pub tiers: Vec<HelixCheermoteTier>,
}

/// Theme -> format -> scale -> URL.
pub type CheermoteImages = HashMap<String, HashMap<String, HashMap<String, String>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct HelixCheermoteTier {
    pub min_bits: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub images: CheermoteImages,
}

impl HelixCheermote {
    /// Keep the dark animated 1x image for each tier.
    pub fn into_definition(self) -> CheermoteDefinition {
        CheermoteDefinition {
            prefix: self.prefix,
            tiers: self
                .tiers
                .into_iter()
                .map(|tier| CheermoteTierData {
                    min_bits: tier.min_bits,
                    image_url: tier
                        .images
                        .get("dark")
                        .and_then(|theme| theme.get("animated"))
                        .and_then(|format| format.get("1"))
                        .cloned(),
                    color: tier.color,
                })
                .collect(),
        }
    }
}

/// Badge set from GET /helix/chat/badges[/global].
#[derive(Debug, Clone, Deserialize)]
pub struct HelixBadgeSet {
    pub set_id: String,
    pub versions: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl HelixBadgeSet {
    /// Collect `image_url_<size>` fields into a size -> URL map per version.
    pub fn into_badge_set(self) -> BadgeSetData {
        let versions = self
            .versions
            .into_iter()
            .map(|fields| {
                let id = fields
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let image_urls: BTreeMap<String, String> = fields
                    .iter()
                    .filter_map(|(key, value)| {
                        let size = key.strip_prefix("image_url_")?;
                        Some((size.to_string(), value.as_str()?.to_string()))
                    })
                    .collect();
                BadgeVersionData { id, image_urls }
            })
            .collect();

        BadgeSetData {
            set_id: self.set_id,
            versions,
        }
    }
}
