// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Viewer sessions over a real WebSocket.

use anglecast::{HealthResponse, ServerMessage, UpdateData};
use anglecast_hub::{build_router, AppState, EchoPolicy, HubConfig};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Viewer = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_hub(config: HubConfig) -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Connect and consume the welcome, so the viewer is open on return.
async fn connect(addr: SocketAddr, path: &str) -> Viewer {
    let (mut ws, _) = connect_async(format!("ws://{}{}", addr, path))
        .await
        .unwrap();
    assert!(next_message(&mut ws).await.is_connection());
    ws
}

async fn next_message(ws: &mut Viewer) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for envelope")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn health(addr: SocketAddr) -> HealthResponse {
    reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn wait_for_clients(addr: SocketAddr, expected: usize) {
    for _ in 0..50 {
        if health(addr).await.clients == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("health never reported {} client(s)", expected);
}

#[tokio::test]
async fn welcome_arrives_before_first_update() {
    let (addr, _state) = spawn_hub(HubConfig::default()).await;
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    match next_message(&mut ws).await {
        ServerMessage::Connection { message } => {
            assert_eq!(message, anglecast::protocol::WELCOME_MESSAGE)
        }
        other => panic!("expected connection, got {:?}", other),
    }

    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/angles", addr))
        .json(&json!({"theta": 1.0, "psi": 2.0, "phi": 3.0, "axraw": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    match next_message(&mut ws).await {
        ServerMessage::AngleUpdate {
            connected,
            data: UpdateData::Sample(sample),
            ..
        } => {
            assert_eq!(connected, Some(true));
            assert_eq!((sample.theta, sample.psi, sample.phi), (1.0, 2.0, 3.0));
            assert_eq!(sample.axraw, 4);
        }
        other => panic!("expected angle_update, got {:?}", other),
    }
}

#[tokio::test]
async fn root_path_accepts_upgrade() {
    let (addr, state) = spawn_hub(HubConfig::default()).await;
    let _ws = connect(addr, "/").await;

    assert_eq!(state.hub.subscriber_count(), 1);
}

#[tokio::test]
async fn viewer_message_is_echoed_to_others() {
    let (addr, _state) = spawn_hub(HubConfig::default()).await;
    let mut sender = connect(addr, "/ws").await;
    let mut other = connect(addr, "/ws").await;

    sender
        .send(Message::Text(r#"{"theta": 7.5}"#.into()))
        .await
        .unwrap();

    for ws in [&mut other, &mut sender] {
        match next_message(ws).await {
            ServerMessage::AngleUpdate {
                connected,
                data: UpdateData::Sample(sample),
                ..
            } => {
                assert_eq!(connected, None);
                assert_eq!(sample.theta, 7.5);
                assert_eq!(sample.phi, 0.0);
            }
            other => panic!("expected echoed angle_update, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn garbage_from_viewer_is_dropped_without_closing() {
    let (addr, state) = spawn_hub(HubConfig::default()).await;
    let mut sender = connect(addr, "/ws").await;
    let mut other = connect(addr, "/ws").await;

    sender.send(Message::Text("not json".into())).await.unwrap();
    sender
        .send(Message::Text(r#"{"hello": "world"}"#.into()))
        .await
        .unwrap();
    sender
        .send(Message::Text(r#"{"psi": -1.0}"#.into()))
        .await
        .unwrap();

    // Only the valid message comes through, and the sender is still served.
    for ws in [&mut other, &mut sender] {
        match next_message(ws).await {
            ServerMessage::AngleUpdate {
                data: UpdateData::Sample(sample),
                ..
            } => assert_eq!(sample.psi, -1.0),
            other => panic!("expected echoed angle_update, got {:?}", other),
        }
    }
    assert_eq!(state.hub.subscriber_count(), 2);
    assert_eq!(state.hub.stats().broadcasts, 1);
}

#[tokio::test]
async fn echo_off_ignores_viewer_messages() {
    let config = HubConfig {
        echo: EchoPolicy::Off,
        ..Default::default()
    };
    let (addr, state) = spawn_hub(config).await;
    let mut sender = connect(addr, "/ws").await;

    sender
        .send(Message::Text(r#"{"theta": 7.5}"#.into()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(state.hub.stats().broadcasts, 0);
    assert_eq!(state.hub.subscriber_count(), 1);
}

#[tokio::test]
async fn closed_viewer_leaves_the_hub() {
    let (addr, _state) = spawn_hub(HubConfig::default()).await;
    let mut first = connect(addr, "/ws").await;
    let _second = connect(addr, "/ws").await;
    wait_for_clients(addr, 2).await;

    first.close(None).await.unwrap();
    wait_for_clients(addr, 1).await;
}

#[tokio::test]
async fn connections_beyond_limit_get_503() {
    let config = HubConfig {
        max_clients: 1,
        ..Default::default()
    };
    let (addr, _state) = spawn_hub(config).await;
    let _first = connect(addr, "/ws").await;

    match connect_async(format!("ws://{}/ws", addr)).await {
        Err(tungstenite::Error::Http(resp)) => assert_eq!(resp.status(), 503),
        Err(e) => panic!("expected HTTP 503, got {}", e),
        Ok(_) => panic!("connection beyond the limit was accepted"),
    }
}

#[tokio::test]
async fn stalled_viewer_is_dropped_after_send_timeout() {
    // Deep queue so only the write deadline can remove the viewer.
    let config = HubConfig {
        queue_depth: 100_000,
        send_timeout_ms: 200,
        ..Default::default()
    };
    let (addr, state) = spawn_hub(config).await;
    let _stalled = connect(addr, "/ws").await;
    assert_eq!(state.hub.subscriber_count(), 1);

    // Never read again; push far more than the socket buffers hold.
    let chunk = "x".repeat(256 * 1024);
    for _ in 0..256 {
        let envelope = ServerMessage::echo("t", UpdateData::Raw(json!(chunk)));
        state.hub.broadcast(&envelope).unwrap();
    }

    for _ in 0..100 {
        if state.hub.connection_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("stalled viewer was never dropped");
}
