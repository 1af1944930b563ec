use std::collections::HashMap;

use regex::Regex;

use super::*;
use crate::metadata::CheermoteDefinition;

/// Immutable set of cheermote ladders for one channel, plus the compiled
/// pattern recognising their tokens.
#[derive(Debug)]
pub struct CheermoteCatalog {
    prefixes: Vec<String>,
    ladders: HashMap<String, TierLadder>,
    /// `None` when the catalog has no prefixes.
    pub(super) pattern: Option<Regex>,
}

impl CheermoteCatalog {
    /// Validate all ladders and compile the token pattern.
    pub fn build(definitions: &[CheermoteDefinition]) -> Result<Self, TwitchError> {
        let mut prefixes = Vec::with_capacity(definitions.len());
        let mut ladders = HashMap::with_capacity(definitions.len());

        for def in definitions {
            if def.prefix.is_empty() {
                return Err(TwitchError::Data("cheermote with empty prefix".into()));
            }
            let ladder = TierLadder::build(&def.prefix, &def.tiers)?;
            if ladders.insert(def.prefix.clone(), ladder).is_some() {
                return Err(TwitchError::Data(format!(
                    "cheermote {:?} defined twice",
                    def.prefix
                )));
            }
            prefixes.push(def.prefix.clone());
        }

        let pattern = compile_pattern(&prefixes)?;
        Ok(Self {
            prefixes,
            ladders,
            pattern,
        })
    }

    /// Catalog with no cheermotes; matches nothing.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
            ladders: HashMap::new(),
            pattern: None,
        }
    }

    /// Known prefixes in source order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn ladder(&self, prefix: &str) -> Option<&TierLadder> {
        self.ladders.get(prefix)
    }

    /// Tier displayed for a cheer of `bits` with a known `prefix`.
    pub fn resolve_token(&self, prefix: &str, bits: u32) -> Option<&Tier> {
        self.ladders.get(prefix).map(|ladder| ladder.resolve(bits))
    }

    /// Image of a tier by its ID (`<prefix><min_bits>`).
    pub fn image_url(&self, tier_id: &str) -> Option<&str> {
        self.ladders
            .values()
            .find_map(|ladder| ladder.get(tier_id))
            .map(|tier| tier.image_url.as_str())
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// `(prefixA|prefixB|...)([0-9]+)`, longest prefixes first.
///
/// Word boundaries are checked by the matcher, not the pattern, since the
/// regex engine has no look-around.
fn compile_pattern(prefixes: &[String]) -> Result<Option<Regex>, TwitchError> {
    if prefixes.is_empty() {
        return Ok(None);
    }

    let mut ordered: Vec<&String> = prefixes.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternatives = ordered
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!("({alternatives})([0-9]+)"))
        .map(Some)
        .map_err(|e| TwitchError::Data(format!("cheermote pattern failed to compile: {e}")))
}
