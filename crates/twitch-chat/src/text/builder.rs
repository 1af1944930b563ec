use super::emote_spec::check_offsets;
use super::*;
use crate::cheer::{CheerMatch, CheermoteCatalog};

/// Explicit server annotations sort ahead of detected cheers at equal offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Emote,
    Cheer,
}

#[derive(Debug)]
struct Location {
    start: usize,
    end: usize,
    source: Source,
    id: String,
    bits: u32,
    bits_color: String,
}

/// Merges emote offsets and cheer tokens into an [`AnnotatedMessage`].
///
/// Without a catalog, only explicit emotes are annotated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentBuilder<'a> {
    catalog: Option<&'a CheermoteCatalog>,
}

impl<'a> SegmentBuilder<'a> {
    pub fn new(catalog: Option<&'a CheermoteCatalog>) -> Self {
        Self { catalog }
    }

    /// Annotate a raw chat line given its optional `emotes` tag value.
    ///
    /// A malformed tag drops every explicit offset for the message; cheer
    /// detection still runs.
    pub fn annotate(&self, message: &str, emote_spec: Option<&str>) -> AnnotatedMessage {
        let emotes = match emote_spec.map(parse_emote_spec).transpose() {
            Ok(emotes) => emotes.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed emote spec");
                Vec::new()
            }
        };
        let cheers = self
            .catalog
            .map(|catalog| catalog.find_cheers(message))
            .unwrap_or_default();

        self.build(message, &emotes, &cheers)
    }

    /// Merge both location lists and fill the gaps with plain text.
    pub fn build(
        &self,
        message: &str,
        emotes: &[EmoteOffset],
        cheers: &[CheerMatch],
    ) -> AnnotatedMessage {
        let mut locations = Vec::with_capacity(emotes.len() + cheers.len());

        match check_offsets(message, emotes) {
            Ok(()) => locations.extend(emotes.iter().map(|e| Location {
                start: e.start,
                end: e.end,
                source: Source::Emote,
                id: e.id.clone(),
                bits: 0,
                bits_color: String::new(),
            })),
            Err(e) => tracing::warn!(error = %e, "Discarding out-of-range emote offsets"),
        }

        locations.extend(cheers.iter().filter_map(|cheer| self.cheer_location(message, cheer)));

        if locations.is_empty() {
            return AnnotatedMessage::plain(message);
        }

        locations.sort_by_key(|l| (l.start, l.source));

        let mut segments = Vec::with_capacity(locations.len() * 2 + 1);
        let mut cursor = 0;
        for location in locations {
            if location.start < cursor {
                tracing::debug!(
                    id = %location.id,
                    start = location.start,
                    "Dropping annotation overlapping an earlier one"
                );
                continue;
            }
            if location.start > cursor {
                segments.push(Segment::plain(&message[cursor..location.start]));
            }

            let text = &message[location.start..=location.end];
            segments.push(Segment::annotated(
                text,
                Annotation {
                    id: location.id,
                    label: Some(text.to_string()),
                    bits: location.bits,
                    bits_color: location.bits_color,
                },
            ));
            cursor = location.end + 1;
        }

        if cursor < message.len() {
            segments.push(Segment::plain(&message[cursor..]));
        }

        AnnotatedMessage::new(segments)
    }

    fn cheer_location(&self, message: &str, cheer: &CheerMatch) -> Option<Location> {
        let fits = cheer.start <= cheer.end
            && cheer.end < message.len()
            && message.is_char_boundary(cheer.start)
            && message.is_char_boundary(cheer.end + 1);
        if !fits {
            tracing::warn!(start = cheer.start, end = cheer.end, "Ignoring out-of-range cheer");
            return None;
        }

        let tier = self.catalog?.resolve_token(&cheer.prefix, cheer.bits)?;
        Some(Location {
            start: cheer.start,
            end: cheer.end,
            source: Source::Cheer,
            id: tier.id.clone(),
            bits: cheer.bits,
            bits_color: tier.color.clone(),
        })
    }
}
