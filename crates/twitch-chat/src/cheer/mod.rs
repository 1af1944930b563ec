//! Cheermotes: tier ladders, the per-channel catalog, and token matching.
//!
//! A cheer token is `<prefix><digits>` standing alone as a word. The digits
//! are a bit amount, which picks the highest tier of that prefix's ladder
//! whose threshold it reaches.

mod catalog;
mod matcher;

pub use catalog::CheermoteCatalog;
pub use matcher::CheerMatch;

use serde::{Deserialize, Serialize};

use crate::TwitchError;
use crate::metadata::CheermoteTierData;

/// One bit threshold of a cheermote prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// `<prefix><min_bits>`, e.g. `Cheer100`.
    pub id: String,
    pub prefix: String,
    pub min_bits: u32,
    pub color: String,
    pub image_url: String,
    /// ID of the next higher tier, `None` for the top tier.
    pub next_tier_id: Option<String>,
}

/// Tiers of one prefix ordered by strictly increasing `min_bits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLadder {
    tiers: Vec<Tier>,
}

impl TierLadder {
    /// Build a ladder from source tiers, validating every field.
    pub fn build(prefix: &str, data: &[CheermoteTierData]) -> Result<Self, TwitchError> {
        if data.is_empty() {
            return Err(TwitchError::Data(format!(
                "cheermote {prefix:?} has no tiers"
            )));
        }

        let mut sorted: Vec<&CheermoteTierData> = data.iter().collect();
        sorted.sort_by_key(|t| t.min_bits);

        let mut tiers: Vec<Tier> = Vec::with_capacity(sorted.len());
        for tier in sorted {
            if let Some(prev) = tiers.last() {
                if prev.min_bits == tier.min_bits {
                    return Err(TwitchError::Data(format!(
                        "cheermote {prefix:?} has duplicate tier {}",
                        tier.min_bits
                    )));
                }
            }

            let color = required_field(prefix, tier.min_bits, "color", &tier.color)?;
            let image_url = required_field(prefix, tier.min_bits, "image", &tier.image_url)?;

            tiers.push(Tier {
                id: format!("{prefix}{}", tier.min_bits),
                prefix: prefix.to_string(),
                min_bits: tier.min_bits,
                color,
                image_url,
                next_tier_id: None,
            });
        }

        for i in 1..tiers.len() {
            tiers[i - 1].next_tier_id = Some(tiers[i].id.clone());
        }

        Ok(Self { tiers })
    }

    /// Pick the tier a cheer of `bits` displays.
    ///
    /// Walks up the ladder while the next tier's threshold is `<= bits`.
    /// Amounts below the first threshold still get the first tier.
    pub fn resolve(&self, bits: u32) -> &Tier {
        let mut current = &self.tiers[0];
        for next in &self.tiers[1..] {
            if next.min_bits > bits {
                break;
            }
            current = next;
        }
        current
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn get(&self, tier_id: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == tier_id)
    }
}

fn required_field(
    prefix: &str,
    min_bits: u32,
    name: &str,
    value: &Option<String>,
) -> Result<String, TwitchError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(TwitchError::Data(format!(
            "cheermote {prefix:?} tier {min_bits} is missing {name}"
        ))),
    }
}
