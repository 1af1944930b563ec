use std::collections::BTreeSet;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as Msg;

use super::*;
use crate::TwitchError;
use crate::config::ClientConfig;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Control messages for a running transport.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IrcCommand {
    Join(String),
    Part(String),
    Shutdown,
}

enum SessionEnd {
    Shutdown,
    Reconnect,
}

enum LineAction {
    Continue,
    Send(String),
    Deliver(InboundLine),
    Reconnect,
}

/// Handle to a running [`IrcTransport`].
#[derive(Debug, Clone)]
pub struct IrcHandle {
    commands: mpsc::Sender<IrcCommand>,
}

impl IrcHandle {
    /// Join a channel now and after every reconnect.
    pub async fn join(&self, channel: &str) -> Result<(), TwitchError> {
        self.send(IrcCommand::Join(channel_name(channel))).await
    }

    pub async fn part(&self, channel: &str) -> Result<(), TwitchError> {
        self.send(IrcCommand::Part(channel_name(channel))).await
    }

    pub async fn shutdown(&self) -> Result<(), TwitchError> {
        self.send(IrcCommand::Shutdown).await
    }

    async fn send(&self, command: IrcCommand) -> Result<(), TwitchError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TwitchError::Transport("IRC transport stopped".into()))
    }
}

/// Read-only anonymous chat connection with auto-reconnect.
///
/// Lines are delivered through a bounded `mpsc::Receiver<InboundLine>`; when
/// the consumer falls behind, the reader blocks instead of dropping lines.
pub struct IrcTransport;

impl IrcTransport {
    /// Start the reader loop. Returns the line receiver and a control handle.
    pub async fn connect(
        config: &ClientConfig,
        channels: &[String],
    ) -> Result<(mpsc::Receiver<InboundLine>, IrcHandle), TwitchError> {
        url::Url::parse(&config.irc_url)?;

        let (line_tx, line_rx) = mpsc::channel::<InboundLine>(config.event_queue_capacity.max(1));
        let (command_tx, command_rx) = mpsc::channel::<IrcCommand>(16);
        let channels: BTreeSet<String> = channels.iter().map(|c| channel_name(c)).collect();

        tokio::spawn(Self::run_loop(
            config.irc_url.clone(),
            channels,
            line_tx,
            command_rx,
        ));
        Ok((line_rx, IrcHandle { commands: command_tx }))
    }

    async fn run_loop(
        url: String,
        mut channels: BTreeSet<String>,
        line_tx: mpsc::Sender<InboundLine>,
        mut command_rx: mpsc::Receiver<IrcCommand>,
    ) {
        let mut failures: u32 = 0;
        loop {
            match Self::connect_once(&url, &mut channels, &line_tx, &mut command_rx).await {
                Ok(SessionEnd::Shutdown) => {
                    tracing::info!("IRC transport stopped");
                    return;
                }
                Ok(SessionEnd::Reconnect) => {
                    failures = 0;
                    tracing::info!("IRC server requested reconnect");
                }
                Err(e) => {
                    failures += 1;
                    let backoff = Self::backoff_duration(failures);
                    tracing::warn!(
                        error = %e, attempt = failures,
                        backoff_secs = backoff.as_secs(),
                        "IRC connection failed, will reconnect"
                    );
                    tokio::select! {
                        command = command_rx.recv() => {
                            match command {
                                Some(IrcCommand::Join(channel)) => { channels.insert(channel); }
                                Some(IrcCommand::Part(channel)) => { channels.remove(&channel); }
                                Some(IrcCommand::Shutdown) | None => {
                                    tracing::info!("IRC shutdown requested during reconnect backoff");
                                    return;
                                }
                            }
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }
    }

    async fn connect_once(
        url: &str,
        channels: &mut BTreeSet<String>,
        line_tx: &mpsc::Sender<InboundLine>,
        command_rx: &mut mpsc::Receiver<IrcCommand>,
    ) -> Result<SessionEnd, TwitchError> {
        tracing::info!(url, "Connecting to Twitch chat");
        let (mut ws, _) = connect_async(url).await?;

        let nick = anonymous_nick();
        send_line(&mut ws, "CAP REQ :twitch.tv/tags twitch.tv/commands").await?;
        send_line(&mut ws, "PASS BLANK").await?;
        send_line(&mut ws, &format!("NICK {nick}")).await?;
        for channel in channels.iter() {
            send_line(&mut ws, &format!("JOIN #{channel}")).await?;
        }

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(IrcCommand::Join(channel)) => {
                            if channels.insert(channel.clone()) {
                                send_line(&mut ws, &format!("JOIN #{channel}")).await?;
                            }
                        }
                        Some(IrcCommand::Part(channel)) => {
                            if channels.remove(&channel) {
                                send_line(&mut ws, &format!("PART #{channel}")).await?;
                            }
                        }
                        Some(IrcCommand::Shutdown) | None => {
                            let _ = ws.close(None).await;
                            return Ok(SessionEnd::Shutdown);
                        }
                    }
                }
                result = tokio::time::timeout(KEEPALIVE_TIMEOUT, ws.next()) => {
                    match result {
                        Ok(Some(Ok(Msg::Text(text)))) => {
                            for line in text.lines().filter(|l| !l.is_empty()) {
                                match Self::handle_line(line) {
                                    LineAction::Continue => {}
                                    LineAction::Send(reply) => send_line(&mut ws, &reply).await?,
                                    LineAction::Deliver(inbound) => {
                                        if line_tx.send(inbound).await.is_err() {
                                            tracing::info!("Line receiver dropped, closing chat connection");
                                            let _ = ws.close(None).await;
                                            return Ok(SessionEnd::Shutdown);
                                        }
                                    }
                                    LineAction::Reconnect => {
                                        let _ = ws.close(None).await;
                                        return Ok(SessionEnd::Reconnect);
                                    }
                                }
                            }
                        }
                        Ok(Some(Ok(Msg::Ping(data)))) => {
                            let _ = ws.send(Msg::Pong(data)).await;
                        }
                        Ok(Some(Ok(Msg::Close(_)))) | Ok(None) => {
                            return Err(TwitchError::Transport("server closed the connection".into()));
                        }
                        Ok(Some(Err(e))) => return Err(TwitchError::WebSocket(e)),
                        Ok(Some(Ok(_))) => {}
                        Err(_) => {
                            return Err(TwitchError::Transport(format!(
                                "no data within {}s",
                                KEEPALIVE_TIMEOUT.as_secs()
                            )));
                        }
                    }
                }
            }
        }
    }

    fn handle_line(line: &str) -> LineAction {
        let Some(msg) = IrcMessage::parse(line) else {
            tracing::debug!(line, "Ignoring unparsable IRC line");
            return LineAction::Continue;
        };

        match msg.command.as_str() {
            "PING" => {
                let token = msg.params.first().map(String::as_str).unwrap_or("tmi.twitch.tv");
                LineAction::Send(format!("PONG :{token}"))
            }
            "RECONNECT" => LineAction::Reconnect,
            "PRIVMSG" => msg
                .to_inbound_line()
                .map_or(LineAction::Continue, LineAction::Deliver),
            "001" => {
                tracing::info!("Connected to Twitch chat");
                LineAction::Continue
            }
            "JOIN" => {
                tracing::debug!(channel = ?msg.params.first(), "Joined channel");
                LineAction::Continue
            }
            "NOTICE" => {
                tracing::warn!(notice = ?msg.params.last(), "Chat server notice");
                LineAction::Continue
            }
            _ => LineAction::Continue,
        }
    }

    fn backoff_duration(failures: u32) -> Duration {
        let d = BASE_BACKOFF * 2u32.saturating_pow(failures.saturating_sub(1));
        d.min(MAX_BACKOFF)
    }
}

async fn send_line(ws: &mut WsStream, line: &str) -> Result<(), TwitchError> {
    ws.send(Msg::Text(line.into())).await?;
    Ok(())
}

/// `justinfan<digits>` logs in read-only without credentials.
fn anonymous_nick() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("justinfan{n}")
}

fn channel_name(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}
