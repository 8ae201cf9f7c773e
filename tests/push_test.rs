//! Push channel tests
//!
//! Runs `PushChannel` against a minimal in-process Socket.IO server built on
//! tokio-tungstenite, checking the handshake, join announcement, ping/pong
//! and event delivery, plus reconnection after the server drops.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use torrentplayer::api::push::{ChannelSignal, PushChannel, PushEvent};
use torrentplayer::models::{SessionId, TransferPhase};

const OPEN: &str = r#"0{"sid":"eio1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (tcp, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(tcp).await.unwrap()
}

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return text.to_string(),
            Message::Close(_) => panic!("client closed"),
            _ => continue,
        }
    }
}

/// Open + namespace connect; returns the client's frames in order
async fn handshake(ws: &mut ServerSocket) -> Vec<String> {
    ws.send(Message::Text(OPEN.into())).await.unwrap();
    let connect = next_text(ws).await;
    ws.send(Message::Text(r#"40{"sid":"sio1"}"#.into()))
        .await
        .unwrap();
    let join = next_text(ws).await;
    vec![connect, join]
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<ChannelSignal>) -> ChannelSignal {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for signal")
        .expect("channel closed")
}

#[tokio::test]
async fn test_handshake_join_and_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let mut frames = handshake(&mut ws).await;

        ws.send(Message::Text("2".into())).await.unwrap();
        frames.push(next_text(&mut ws).await);

        for frame in [
            r#"42["status",{"message":"Connected to server"}]"#,
            r#"42["something_unrelated",{}]"#,
            r#"42["torrent_progress",{"session_id":"session_push00001","status":"downloading","progress":12.5,"download_rate":1048576,"peers":8}]"#,
            r#"42["video_ready",{"session_id":"session_push00001","video_path":"/api/video/session_push00001"}]"#,
        ] {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }

        // Hold the socket open until the client goes away
        while let Some(Ok(_)) = ws.next().await {}
        frames
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = PushChannel::spawn(
        &format!("http://{}", addr),
        SessionId::from_string("session_push00001"),
        tx,
    );

    assert_eq!(recv(&mut rx).await, ChannelSignal::Connected);

    match recv(&mut rx).await {
        ChannelSignal::Event(PushEvent::ServerStatus { message }) => {
            assert_eq!(message, "Connected to server")
        }
        other => panic!("expected status, got {:?}", other),
    }

    // The unrelated event is dropped; progress comes next
    match recv(&mut rx).await {
        ChannelSignal::Event(PushEvent::TransferProgress(progress)) => {
            assert_eq!(progress.status, TransferPhase::Downloading);
            assert_eq!(progress.peers, 8);
            assert_eq!(progress.to_status().format_rate(), "1 MB/s");
        }
        other => panic!("expected progress, got {:?}", other),
    }

    match recv(&mut rx).await {
        ChannelSignal::Event(event @ PushEvent::VideoReady(_)) => {
            assert_eq!(event.session_id(), Some("session_push00001"));
        }
        other => panic!("expected video_ready, got {:?}", other),
    }

    channel.shutdown();
    let frames = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(
        frames,
        vec![
            "40".to_string(),
            r#"42["join_session",{"session_id":"session_push00001"}]"#.to_string(),
            "3".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First connection: handshake, then close
        let mut ws = accept(&listener).await;
        handshake(&mut ws).await;
        ws.send(Message::Text("1".into())).await.unwrap();
        drop(ws);

        // Second connection must join the same session again
        let mut ws = accept(&listener).await;
        let frames = handshake(&mut ws).await;
        while let Some(Ok(_)) = ws.next().await {}
        frames
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = PushChannel::spawn(
        &format!("http://{}", addr),
        SessionId::from_string("session_again0001"),
        tx,
    );

    assert_eq!(recv(&mut rx).await, ChannelSignal::Connected);
    assert_eq!(recv(&mut rx).await, ChannelSignal::Disconnected);
    assert_eq!(recv(&mut rx).await, ChannelSignal::Connected);

    channel.shutdown();
    let frames = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(
        frames[1],
        r#"42["join_session",{"session_id":"session_again0001"}]"#
    );
}

#[tokio::test]
async fn test_connect_error_does_not_signal_connected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(Message::Text(OPEN.into())).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::Text(r#"44{"message":"Not authorized"}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = PushChannel::spawn(
        &format!("http://{}", addr),
        SessionId::from_string("session_refused01"),
        tx,
    );

    let signal = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(signal.is_err(), "unexpected signal: {:?}", signal);
    channel.shutdown();
}
