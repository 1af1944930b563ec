//! Anonymous Twitch chat transport over IRC-on-WebSocket.
//!
//! Parses IRCv3 lines (tags, prefix, command, params) and turns channel
//! PRIVMSGs into [`InboundLine`]s.

mod connection;

pub use connection::{IrcHandle, IrcTransport};

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::event::{InboundLine, Viewer};

const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(6 * 60);
const BASE_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const ACTION_PREFIX: &str = "\u{1}ACTION ";

/// One parsed IRC line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line; `None` if it has no command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut msg = IrcMessage::default();

        if let Some(stripped) = rest.strip_prefix('@') {
            let (tags, after) = stripped.split_once(' ')?;
            msg.tags = parse_tags(tags);
            rest = after.trim_start_matches(' ');
        }

        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, after) = stripped.split_once(' ')?;
            msg.prefix = Some(prefix.to_string());
            rest = after.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }
        msg.command = command.to_ascii_uppercase();

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                msg.params.push(trailing.to_string());
                break;
            }
            let (param, after) = rest.split_once(' ').unwrap_or((rest, ""));
            msg.params.push(param.to_string());
            rest = after;
        }

        Some(msg)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split(['!', '@']).next().unwrap_or(prefix))
    }

    /// Convert a channel PRIVMSG into an [`InboundLine`].
    pub fn to_inbound_line(&self) -> Option<InboundLine> {
        if self.command != "PRIVMSG" {
            return None;
        }
        let target = self.params.first()?;
        let channel = target.strip_prefix('#')?;
        let text = self.params.get(1)?;

        let (raw_text, is_action) = match text.strip_prefix(ACTION_PREFIX) {
            Some(inner) => (inner.strip_suffix('\u{1}').unwrap_or(inner), true),
            None => (text.as_str(), false),
        };

        let timestamp = self
            .tag("tmi-sent-ts")
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        Some(InboundLine {
            channel: channel.to_string(),
            sender: self.sender(),
            timestamp,
            raw_text: raw_text.to_string(),
            emote_spec: self.tag("emotes").map(str::to_string),
            is_action,
            message_id: self.tag("id").filter(|id| !id.is_empty()).map(str::to_string),
        })
    }

    fn sender(&self) -> Viewer {
        let user = self
            .nick()
            .or_else(|| self.tag("login"))
            .unwrap_or_default()
            .to_string();
        let non_empty = |key: &str| self.tag(key).filter(|v| !v.is_empty());

        Viewer {
            display: non_empty("display-name")
                .filter(|d| *d != user)
                .map(str::to_string),
            color: non_empty("color").map(str::to_string),
            badges: non_empty("badges")
                .map(|b| b.split(',').filter(|k| !k.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            user,
        }
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|t| !t.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (tag.to_string(), String::new()),
        })
        .collect()
}

/// Undo IRCv3 tag escaping (`\:` `\s` `\\` `\r` `\n`).
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
