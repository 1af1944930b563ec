use serde::Serialize;

use super::*;

/// A cheer token found in message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheerMatch {
    pub prefix: String,
    pub bits: u32,
    /// Byte offset of the token's first character.
    pub start: usize,
    /// Byte offset of the token's last byte (inclusive).
    pub end: usize,
}

impl CheermoteCatalog {
    /// Find every whole-word cheer token in `text`, left to right.
    ///
    /// Prefixes match case-sensitively. A token whose amount does not fit in
    /// a `u32` is skipped without affecting the rest of the scan.
    pub fn find_cheers(&self, text: &str) -> Vec<CheerMatch> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let Some(caps) = pattern.captures_at(text, pos) else {
                break;
            };
            let (Some(whole), Some(prefix), Some(digits)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                break;
            };

            if !is_word_boundary(text, whole.start(), whole.end()) {
                pos = next_char_boundary(text, whole.start());
                continue;
            }

            pos = whole.end();
            match digits.as_str().parse::<u32>() {
                Ok(bits) => found.push(CheerMatch {
                    prefix: prefix.as_str().to_string(),
                    bits,
                    start: whole.start(),
                    end: whole.end() - 1,
                }),
                Err(e) => {
                    tracing::debug!(
                        token = whole.as_str(),
                        error = %e,
                        "Skipping cheer token with out-of-range amount"
                    );
                }
            }
        }

        found
    }
}

/// The token `text[start..end]` is not glued to an alphanumeric on either side.
fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len(), |c| from + c.len_utf8())
}
