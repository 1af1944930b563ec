//! Chat events produced by the client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::AnnotatedMessage;

/// Author of a chat line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user: String,
    /// Display name, only when it differs from `user`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Badge keys (`set/version`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.badges.is_empty() {
            let badges: Vec<&str> = self
                .badges
                .iter()
                .map(|b| b.strip_suffix("/1").unwrap_or(b))
                .collect();
            write!(f, "<{}> ", badges.join(", "))?;
        }

        let color = self.color.as_deref().unwrap_or_default();
        match self.display.as_deref() {
            None => write!(f, "{}{color}", self.user),
            Some(display) if display.to_lowercase() == self.user => {
                write!(f, "{display}{color}")
            }
            Some(display) => write!(f, "{display}{color}@{}", self.user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Action,
}

/// One chat line as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundLine {
    pub channel: String,
    pub sender: Viewer,
    pub timestamp: DateTime<Utc>,
    pub raw_text: String,
    /// Value of the `emotes` tag, if the server sent one.
    pub emote_spec: Option<String>,
    pub is_action: bool,
    pub message_id: Option<String>,
}

/// An annotated chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub channel: String,
    pub sender: Viewer,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub message: AnnotatedMessage,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} in {}] ", self.time.format("%H:%M"), self.channel)?;
        match self.kind {
            EventKind::Message => write!(f, "{}: {}", self.sender, self.message),
            EventKind::Action => write!(f, "* {} {}", self.sender, self.message),
        }
    }
}
