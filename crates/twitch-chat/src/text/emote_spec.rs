use crate::TwitchError;

/// Byte range of an emote reported by the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteOffset {
    pub id: String,
    pub start: usize,
    /// Inclusive.
    pub end: usize,
}

/// Parse an `emotes` tag value: `id:start-end[,start-end...][/id2:...]`.
///
/// An empty value yields no offsets. Any malformed entry fails the whole
/// spec; callers discard partially parsed data.
pub fn parse_emote_spec(spec: &str) -> Result<Vec<EmoteOffset>, TwitchError> {
    let mut offsets = Vec::new();

    for entry in spec.split('/').filter(|e| !e.is_empty()) {
        let (id, ranges) = entry
            .split_once(':')
            .ok_or_else(|| invalid(entry, "missing ':'"))?;
        if id.is_empty() {
            return Err(invalid(entry, "empty emote id"));
        }

        for range in ranges.split(',') {
            let (start, end) = range
                .split_once('-')
                .ok_or_else(|| invalid(entry, "missing '-'"))?;
            let start: usize = start
                .parse()
                .map_err(|e| invalid(entry, &format!("bad start offset: {e}")))?;
            let end: usize = end
                .parse()
                .map_err(|e| invalid(entry, &format!("bad end offset: {e}")))?;

            offsets.push(EmoteOffset {
                id: id.to_string(),
                start,
                end,
            });
        }
    }

    Ok(offsets)
}

/// Check that every offset addresses a valid, non-empty slice of `message`.
pub(super) fn check_offsets(message: &str, offsets: &[EmoteOffset]) -> Result<(), TwitchError> {
    for offset in offsets {
        let in_bounds = offset.start <= offset.end && offset.end < message.len();
        if !in_bounds
            || !message.is_char_boundary(offset.start)
            || !message.is_char_boundary(offset.end + 1)
        {
            return Err(TwitchError::InvalidEmoteSpec(format!(
                "emote {} range {}-{} does not fit a message of {} bytes",
                offset.id,
                offset.start,
                offset.end,
                message.len()
            )));
        }
    }
    Ok(())
}

fn invalid(entry: &str, reason: &str) -> TwitchError {
    TwitchError::InvalidEmoteSpec(format!("{entry:?}: {reason}"))
}
