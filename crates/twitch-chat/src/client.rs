//! Chat client: drives inbound lines through the annotation pipeline.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::TwitchError;
use crate::cache::ChannelMetadataCache;
use crate::config::ClientConfig;
use crate::event::{Event, EventKind, InboundLine};
use crate::helix::HelixMetadataSource;
use crate::irc::{IrcHandle, IrcTransport};
use crate::metadata::MetadataSource;
use crate::text::SegmentBuilder;

/// Annotates chat lines using lazily cached channel metadata.
///
/// Lines are processed one at a time in arrival order. The first line seen
/// in a channel waits for that channel's cheermotes to load.
pub struct ChatClient<S> {
    cache: Arc<ChannelMetadataCache<S>>,
    queue_capacity: usize,
}

impl<S> Clone for ChatClient<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            queue_capacity: self.queue_capacity,
        }
    }
}

impl ChatClient<HelixMetadataSource> {
    /// Client backed by the Helix API with an app access token.
    pub fn with_helix(config: &ClientConfig) -> Result<Self, TwitchError> {
        config.validate()?;
        Ok(Self::new(HelixMetadataSource::from_config(config), config))
    }

    /// Connect anonymously to chat, join `channels`, and stream events.
    pub async fn connect(
        config: &ClientConfig,
        channels: &[String],
    ) -> Result<(Self, mpsc::Receiver<Event>, IrcHandle), TwitchError> {
        let client = Self::with_helix(config)?;
        let (lines, handle) = IrcTransport::connect(config, channels).await?;
        let events = client.clone().spawn(lines);
        Ok((client, events, handle))
    }
}

impl<S: MetadataSource + 'static> ChatClient<S> {
    pub fn new(source: S, config: &ClientConfig) -> Self {
        Self {
            cache: Arc::new(ChannelMetadataCache::new(source, config.metadata_timeout)),
            queue_capacity: config.event_queue_capacity.max(1),
        }
    }

    pub fn cache(&self) -> &ChannelMetadataCache<S> {
        &self.cache
    }

    /// Turn one inbound line into an event.
    ///
    /// If the channel's cheermotes cannot be loaded, the line is annotated
    /// with explicit emotes only.
    pub async fn annotate(&self, line: InboundLine) -> Event {
        let catalog = match self.cache.get_cheermote_catalog(&line.channel).await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(
                    channel = %line.channel,
                    error = %e,
                    "Cheermotes unavailable, annotating emotes only"
                );
                None
            }
        };

        let message = SegmentBuilder::new(catalog.as_deref())
            .annotate(&line.raw_text, line.emote_spec.as_deref());

        Event {
            time: line.timestamp,
            channel: line.channel,
            sender: line.sender,
            kind: if line.is_action {
                EventKind::Action
            } else {
                EventKind::Message
            },
            message_id: line.message_id,
            message,
        }
    }

    /// Drain `lines` on a single task and emit one event per line, in order.
    ///
    /// The task ends when `lines` closes or the event receiver is dropped.
    pub fn spawn(self, mut lines: mpsc::Receiver<InboundLine>) -> mpsc::Receiver<Event> {
        let (event_tx, event_rx) = mpsc::channel(self.queue_capacity);
        tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                let event = self.annotate(line).await;
                if event_tx.send(event).await.is_err() {
                    tracing::info!("Event receiver dropped, stopping annotation");
                    return;
                }
            }
            tracing::debug!("Inbound line queue closed");
        });
        event_rx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::event::Viewer;
    use crate::metadata::{BadgeScope, BadgeSetData, CheermoteDefinition, CheermoteTierData};

    #[derive(Default)]
    struct StubSource {
        cheermote_calls: AtomicUsize,
        offline: bool,
    }

    impl MetadataSource for StubSource {
        async fn fetch_broadcaster_id(&self, login: &str) -> Result<String, TwitchError> {
            if self.offline {
                return Err(TwitchError::ApiError {
                    status: 500,
                    message: "down".into(),
                });
            }
            Ok(format!("id-{login}"))
        }

        async fn fetch_cheermotes(&self, _: &str) -> Result<Vec<CheermoteDefinition>, TwitchError> {
            self.cheermote_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CheermoteDefinition {
                prefix: "Cheer".into(),
                tiers: vec![
                    CheermoteTierData {
                        min_bits: 1,
                        color: Some("#979797".into()),
                        image_url: Some("https://cdn/1.gif".into()),
                    },
                    CheermoteTierData {
                        min_bits: 100,
                        color: Some("#9c3ee8".into()),
                        image_url: Some("https://cdn/100.gif".into()),
                    },
                ],
            }])
        }

        async fn fetch_badges(&self, _: BadgeScope<'_>) -> Result<Vec<BadgeSetData>, TwitchError> {
            Ok(Vec::new())
        }
    }

    fn line(channel: &str, text: &str, emotes: Option<&str>) -> InboundLine {
        InboundLine {
            channel: channel.into(),
            sender: Viewer {
                user: "viewer".into(),
                ..Viewer::default()
            },
            timestamp: Utc::now(),
            raw_text: text.into(),
            emote_spec: emotes.map(Into::into),
            is_action: false,
            message_id: None,
        }
    }

    #[tokio::test]
    async fn test_annotate_merges_emotes_and_cheers() {
        let client = ChatClient::new(StubSource::default(), &ClientConfig::default());
        let event = client
            .annotate(line("chan", "Kappa Cheer150 nice", Some("25:0-4")))
            .await;

        assert_eq!(event.kind, EventKind::Message);
        assert_eq!(
            event.message.to_string(),
            "<Kappa:25> <Cheer150:Cheer100*150 #9c3ee8> nice"
        );
        assert_eq!(event.message.raw_text(), "Kappa Cheer150 nice");
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_explicit_emotes() {
        let source = StubSource {
            offline: true,
            ..StubSource::default()
        };
        let client = ChatClient::new(source, &ClientConfig::default());
        let mut inbound = line("chan", "Kappa Cheer150", Some("25:0-4"));
        inbound.is_action = true;
        let event = client.annotate(inbound).await;

        assert_eq!(event.kind, EventKind::Action);
        assert_eq!(event.message.to_string(), "<Kappa:25> Cheer150");
    }

    #[tokio::test]
    async fn test_spawned_consumer_preserves_order() {
        let client = ChatClient::new(StubSource::default(), &ClientConfig::default());
        let (line_tx, line_rx) = mpsc::channel(4);
        let mut events = client.clone().spawn(line_rx);

        for text in ["one Cheer1", "two", "three Cheer100"] {
            line_tx.send(line("#Chan", text, None)).await.unwrap();
        }
        drop(line_tx);

        let mut texts = Vec::new();
        while let Some(event) = events.recv().await {
            texts.push(event.message.raw_text());
        }
        assert_eq!(texts, ["one Cheer1", "two", "three Cheer100"]);
        assert_eq!(
            client.cache().source().cheermote_calls.load(Ordering::SeqCst),
            1
        );
    }
}
