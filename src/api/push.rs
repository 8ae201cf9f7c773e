//! Push channel: server-to-client progress and readiness events
//!
//! The server speaks Socket.IO (v5) over the Engine.IO v4 WebSocket
//! transport. Only the subset needed here is implemented: handshake,
//! ping/pong, namespace connect and JSON events.
//!
//! ```text
//! server  0{"sid":"..","pingInterval":25000,..}     engine.io open
//! client  40                                         socket.io connect
//! server  40{"sid":".."}                             connect ack
//! client  42["join_session",{"session_id":".."}]
//! server  42["torrent_progress",{..}]
//! server  2        client  3                         ping / pong
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::models::{Movie, SessionId, TransferPhase, TransferStatus};

/// Socket.IO namespace connect request
pub const CONNECT_PACKET: &str = "40";
/// Engine.IO pong
pub const PONG_PACKET: &str = "3";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Push channel error types
#[derive(Error, Debug)]
pub enum PushError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed packet: {0}")]
    Malformed(String),

    #[error("Server refused connection: {0}")]
    Refused(String),
}

// =============================================================================
// Events
// =============================================================================

/// `torrent_progress` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: String,
    pub status: TransferPhase,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub download_rate: f64,
    #[serde(default)]
    pub peers: u32,
}

impl ProgressEvent {
    pub fn to_status(&self) -> TransferStatus {
        TransferStatus {
            phase: self.status.clone(),
            progress: self.progress,
            download_rate: self.download_rate,
            peers: self.peers,
        }
    }
}

/// `video_ready` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoReadyEvent {
    pub session_id: String,
    pub video_path: String,
    #[serde(default, deserialize_with = "movie_or_none")]
    pub movie: Option<Movie>,
}

/// The attached movie is informational; a bad one must not drop the event
fn movie_or_none<'de, D>(deserializer: D) -> Result<Option<Movie>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Decoded server event
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    TransferProgress(ProgressEvent),
    VideoReady(VideoReadyEvent),
    /// Ack of our `join_session`
    SessionJoined { session_id: String },
    /// Free-form server greeting sent on connect
    ServerStatus { message: String },
}

impl PushEvent {
    /// Map a named Socket.IO event to a typed event; unknown names yield `None`
    pub fn from_event(name: &str, payload: serde_json::Value) -> Result<Option<Self>, PushError> {
        let malformed = |e: serde_json::Error| PushError::Malformed(format!("{}: {}", name, e));
        let event = match name {
            "torrent_progress" => {
                PushEvent::TransferProgress(serde_json::from_value(payload).map_err(malformed)?)
            }
            "video_ready" => {
                PushEvent::VideoReady(serde_json::from_value(payload).map_err(malformed)?)
            }
            "session_joined" => PushEvent::SessionJoined {
                session_id: payload
                    .get("session_id")
                    .and_then(|s| s.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            "status" => PushEvent::ServerStatus {
                message: payload
                    .get("message")
                    .and_then(|s| s.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Session the event is addressed to, if it carries one
    pub fn session_id(&self) -> Option<&str> {
        match self {
            PushEvent::TransferProgress(e) => Some(&e.session_id),
            PushEvent::VideoReady(e) => Some(&e.session_id),
            PushEvent::SessionJoined { session_id } => Some(session_id),
            PushEvent::ServerStatus { .. } => None,
        }
    }
}

/// What the channel task reports to the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Connected,
    Disconnected,
    Event(PushEvent),
}

// =============================================================================
// Packet Codec
// =============================================================================

/// Engine.IO open handshake
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// Decoded text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// Socket.IO namespace connect ack
    Connect,
    Disconnect,
    Event {
        name: String,
        payload: serde_json::Value,
    },
    ConnectError(String),
    /// Valid but irrelevant here (acks, binary events, upgrades)
    Ignored(char),
}

/// Decode a single Engine.IO text frame
pub fn decode(frame: &str) -> Result<Packet, PushError> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| PushError::Malformed("empty frame".to_string()))?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|e| PushError::Malformed(format!("handshake: {}", e))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '6' => Ok(Packet::Noop),
        '4' => decode_socket(rest),
        '5' => Ok(Packet::Ignored(kind)),
        other => Err(PushError::Malformed(format!("unknown packet type {:?}", other))),
    }
}

fn decode_socket(body: &str) -> Result<Packet, PushError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| PushError::Malformed("empty message".to_string()))?;
    let rest = skip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(rest),
        '4' => Ok(Packet::ConnectError(rest.to_string())),
        '3' | '5' | '6' => Ok(Packet::Ignored(kind)),
        other => Err(PushError::Malformed(format!("unknown message type {:?}", other))),
    }
}

/// Strip an optional `/namespace,` prefix
fn skip_namespace(s: &str) -> &str {
    if s.starts_with('/') {
        match s.find(',') {
            Some(idx) => &s[idx + 1..],
            None => "",
        }
    } else {
        s
    }
}

fn decode_event(s: &str) -> Result<Packet, PushError> {
    // Optional ack id before the JSON array
    let json = s.trim_start_matches(|c: char| c.is_ascii_digit());
    let array: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| PushError::Malformed(format!("event body: {}", e)))?;
    let mut items = array.into_iter();
    let name = match items.next() {
        Some(serde_json::Value::String(name)) => name,
        _ => return Err(PushError::Malformed("event without name".to_string())),
    };
    let payload = items.next().unwrap_or(serde_json::Value::Null);
    Ok(Packet::Event { name, payload })
}

/// Encode a Socket.IO event frame: `42["name",payload]`
pub fn encode_event(name: &str, payload: &serde_json::Value) -> String {
    let array = serde_json::Value::Array(vec![
        serde_json::Value::String(name.to_string()),
        payload.clone(),
    ]);
    format!("42{}", array)
}

/// `join_session` announcement for this client
pub fn join_session_frame(session: &SessionId) -> String {
    encode_event(
        "join_session",
        &serde_json::json!({ "session_id": session.as_str() }),
    )
}

/// WebSocket endpoint for a server base URL
pub fn socket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/socket.io/?EIO=4&transport=websocket", ws_base)
}

// =============================================================================
// Connection
// =============================================================================

/// Handle to the background push-channel task
pub struct PushChannel {
    handle: JoinHandle<()>,
}

impl PushChannel {
    /// Spawn the channel task. It reconnects with backoff until the receiver
    /// side of `signals` is dropped or [`PushChannel::shutdown`] is called.
    pub fn spawn(
        base_url: &str,
        session: SessionId,
        signals: mpsc::UnboundedSender<ChannelSignal>,
    ) -> Self {
        let url = socket_url(base_url);
        let handle = tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                let mut connected = false;
                match run_connection(&url, &session, &signals, &mut connected).await {
                    Ok(()) => debug!("push channel closed by server"),
                    Err(e) => warn!("push channel error: {}", e),
                }
                if connected {
                    backoff = INITIAL_BACKOFF;
                    if signals.send(ChannelSignal::Disconnected).is_err() {
                        break;
                    }
                }
                if signals.is_closed() {
                    break;
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        });
        Self { handle }
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_connection(
    url: &str,
    session: &SessionId,
    signals: &mpsc::UnboundedSender<ChannelSignal>,
    connected: &mut bool,
) -> Result<(), PushError> {
    let (stream, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut write, mut read) = stream.split();

    while let Some(message) = read.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let packet = match decode(&text) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("ignoring frame: {}", e);
                continue;
            }
        };

        match packet {
            Packet::Open(handshake) => {
                debug!(sid = %handshake.sid, ping = handshake.ping_interval, "engine.io open");
                write.send(Message::Text(CONNECT_PACKET.to_string())).await?;
            }
            Packet::Connect => {
                info!("push channel connected");
                *connected = true;
                if signals.send(ChannelSignal::Connected).is_err() {
                    break;
                }
                write.send(Message::Text(join_session_frame(session))).await?;
            }
            Packet::Ping => {
                write.send(Message::Text(PONG_PACKET.to_string())).await?;
            }
            Packet::Event { name, payload } => match PushEvent::from_event(&name, payload) {
                Ok(Some(event)) => {
                    if signals.send(ChannelSignal::Event(event)).is_err() {
                        break;
                    }
                }
                Ok(None) => debug!(%name, "unhandled push event"),
                Err(e) => warn!("{}", e),
            },
            Packet::ConnectError(reason) => return Err(PushError::Refused(reason)),
            Packet::Close | Packet::Disconnect => break,
            Packet::Pong | Packet::Noop | Packet::Ignored(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open() {
        let packet = decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
            .unwrap();
        match packet {
            Packet::Open(h) => {
                assert_eq!(h.sid, "abc");
                assert_eq!(h.ping_interval, 25000);
            }
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_packets() {
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode("1").unwrap(), Packet::Close);
        assert_eq!(decode(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connect);
        assert_eq!(decode("41").unwrap(), Packet::Disconnect);
        assert!(decode("").is_err());
        assert!(decode("9").is_err());
    }

    #[test]
    fn test_decode_event() {
        let frame = r#"42["torrent_progress",{"session_id":"s1","status":"downloading","progress":12.5,"download_rate":2048,"peers":4}]"#;
        let Packet::Event { name, payload } = decode(frame).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(name, "torrent_progress");
        let event = PushEvent::from_event(&name, payload).unwrap().unwrap();
        match event {
            PushEvent::TransferProgress(p) => {
                assert_eq!(p.session_id, "s1");
                assert_eq!(p.status, TransferPhase::Downloading);
                assert_eq!(p.peers, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let frame = r#"42/player,17["video_ready",{"session_id":"s1","video_path":"/api/video/s1"}]"#;
        let Packet::Event { name, payload } = decode(frame).unwrap() else {
            panic!("expected event");
        };
        assert_eq!(name, "video_ready");
        assert_eq!(payload["video_path"], "/api/video/s1");
    }

    #[test]
    fn test_video_ready_tolerates_null_movie_fields() {
        let payload = serde_json::json!({
            "session_id": "s1",
            "video_path": "/api/video/s1",
            "movie": {"id": 9, "title": "Heat", "rating": null, "genres": null}
        });
        let Some(PushEvent::VideoReady(ready)) =
            PushEvent::from_event("video_ready", payload).unwrap()
        else {
            panic!("expected video_ready");
        };
        let movie = ready.movie.unwrap();
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.rating, None);

        let payload = serde_json::json!({
            "session_id": "s1",
            "video_path": "/api/video/s1",
            "movie": {"title": "no id"}
        });
        let Some(PushEvent::VideoReady(ready)) =
            PushEvent::from_event("video_ready", payload).unwrap()
        else {
            panic!("expected video_ready");
        };
        assert_eq!(ready.video_path, "/api/video/s1");
        assert!(ready.movie.is_none());
    }

    #[test]
    fn test_unknown_event_name_is_none() {
        let event = PushEvent::from_event("something_else", serde_json::json!({})).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn test_malformed_progress_payload() {
        let result = PushEvent::from_event("torrent_progress", serde_json::json!({"peers": 1}));
        assert!(matches!(result, Err(PushError::Malformed(_))));
    }

    #[test]
    fn test_join_session_frame() {
        let session = SessionId::from_string("session_abc123xyz");
        assert_eq!(
            join_session_frame(&session),
            r#"42["join_session",{"session_id":"session_abc123xyz"}]"#
        );
    }

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("http://localhost:5000/"),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("https://player.example"),
            "wss://player.example/socket.io/?EIO=4&transport=websocket"
        );
    }
}
