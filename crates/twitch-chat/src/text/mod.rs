//! Annotated chat text.
//!
//! A message is split into [`Segment`]s: plain runs and annotated runs
//! (emotes and cheers). Concatenating the segment texts always yields the
//! original message.

mod builder;
mod emote_spec;
#[cfg(test)]
mod tests;

pub use builder::SegmentBuilder;
pub use emote_spec::{EmoteOffset, parse_emote_spec};

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Emote or cheer attached to a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Emote ID, or the tier ID for a cheer.
    pub id: String,
    pub label: Option<String>,
    /// Bit amount; 0 for emotes.
    pub bits: u32,
    /// Tier color; empty for emotes.
    pub bits_color: String,
}

/// One contiguous run of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub annotation: Option<Annotation>,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotation: None,
        }
    }

    pub fn annotated(text: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            text: text.into(),
            annotation: Some(annotation),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.annotation.is_none()
    }

    /// Cheer tiers always carry a color, even for a zero-bit token.
    pub fn is_cheer(&self) -> bool {
        self.annotation
            .as_ref()
            .is_some_and(|a| !a.bits_color.is_empty())
    }
}

/// Ordered, gap-free segmentation of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedMessage {
    segments: Vec<Segment>,
}

impl AnnotatedMessage {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The whole message as a single plain segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Segment::plain(text)])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Reassemble the original message.
    pub fn raw_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Total bits cheered in this message.
    pub fn total_bits(&self) -> u64 {
        self.segments
            .iter()
            .filter_map(|s| s.annotation.as_ref())
            .map(|a| u64::from(a.bits))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Debug rendering: plain text verbatim, annotations as `<label:id>` or
/// `<label:id*bits color>`.
impl fmt::Display for AnnotatedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            let Some(annotation) = &segment.annotation else {
                f.write_str(&segment.text)?;
                continue;
            };

            f.write_str("<")?;
            if let Some(label) = annotation.label.as_deref().filter(|l| !l.is_empty()) {
                write!(f, "{label}:")?;
            }
            f.write_str(&annotation.id)?;
            if annotation.bits != 0 {
                write!(f, "*{}", annotation.bits)?;
            }
            if !annotation.bits_color.is_empty() {
                write!(f, " {}", annotation.bits_color)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Structured element: a bare string for plain text or an annotation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Element {
    Text(String),
    Annotation(AnnotationRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AnnotationRecord {
    emote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    bits: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    bits_color: String,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Serialize for AnnotatedMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let elements: Vec<Element> = self
            .segments
            .iter()
            .filter_map(|segment| match &segment.annotation {
                None if segment.text.is_empty() => None,
                None => Some(Element::Text(segment.text.clone())),
                Some(a) => Some(Element::Annotation(AnnotationRecord {
                    emote: a.id.clone(),
                    name: a.label.clone().filter(|l| !l.is_empty()),
                    bits: a.bits,
                    bits_color: a.bits_color.clone(),
                })),
            })
            .collect();
        elements.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnnotatedMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<Element>::deserialize(deserializer)?;
        let segments = elements
            .into_iter()
            .map(|element| match element {
                Element::Text(text) => Ok(Segment::plain(text)),
                Element::Annotation(record) => {
                    // Annotated text is carried only as `name`.
                    let text = match record.name {
                        Some(name) if !name.is_empty() => name,
                        Some(_) => {
                            return Err(<D::Error as de::Error>::invalid_value(
                                de::Unexpected::Str(""),
                                &"non-empty annotated text",
                            ));
                        }
                        None => return Err(<D::Error as de::Error>::missing_field("name")),
                    };
                    Ok(Segment::annotated(
                        text.clone(),
                        Annotation {
                            id: record.emote,
                            label: Some(text),
                            bits: record.bits,
                            bits_color: record.bits_color,
                        },
                    ))
                }
            })
            .collect::<Result<Vec<_>, D::Error>>()?;
        Ok(Self::new(segments))
    }
}
