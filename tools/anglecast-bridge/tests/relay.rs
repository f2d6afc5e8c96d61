// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device lines through the bridge and an in-process hub to a viewer.

use anglecast::{ServerMessage, UpdateData};
use anglecast_bridge::{
    spawn_reader, BridgeConfig, IngestError, LineIngestor, Relay, RelayOutcome, SessionStats,
    UplinkTransmitter,
};
use anglecast_hub::{build_router, AppState, HubConfig};
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_hub() -> (String, Arc<AppState>) {
    let state = Arc::new(AppState::new(HubConfig::default()));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn relay_to(hub_url: String) -> Relay {
    let config = BridgeConfig {
        hub_url,
        ..Default::default()
    };
    let uplink = UplinkTransmitter::new(&config, Arc::new(SessionStats::new())).unwrap();
    Relay::new(uplink, Duration::from_secs(1))
}

fn angles(text: &str) -> (f64, f64, f64) {
    match serde_json::from_str::<ServerMessage>(text).unwrap() {
        ServerMessage::AngleUpdate {
            data: UpdateData::Sample(sample),
            ..
        } => (sample.theta, sample.psi, sample.phi),
        other => panic!("expected angle_update, got {:?}", other),
    }
}

#[tokio::test]
async fn device_lines_reach_viewer_in_order() {
    let (url, state) = spawn_hub().await;
    let mut viewer = state.hub.subscribe().unwrap();

    let device = "START\n\
                  Theta,Psi,Phi,AxRaw,AyRaw,AzRaw,AxVolt,AyVolt,AzVolt\n\
                  \n\
                  12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30\n\
                  1.0,2.0\n\
                  -7.25,4.00,90.00,600,512,480,1.50,1.25,1.20\n";
    let lines = spawn_reader(LineIngestor::new(Cursor::new(device)), 4).unwrap();

    let mut relay = relay_to(url);
    let outcome = relay.run(lines).await.unwrap();

    let RelayOutcome::TransportClosed(snapshot) = outcome;
    assert_eq!(snapshot.lines_read, 3);
    assert_eq!(snapshot.decode_rejected, 1);
    assert_eq!(snapshot.relayed, 2);
    assert_eq!(snapshot.failures, 0);
    assert_eq!(state.hub.stats().broadcasts, 2);

    let welcome = viewer.try_recv().unwrap();
    assert!(serde_json::from_str::<ServerMessage>(&welcome)
        .unwrap()
        .is_connection());
    assert_eq!(angles(&viewer.try_recv().unwrap()), (12.5, -3.2, 0.0));
    assert_eq!(angles(&viewer.try_recv().unwrap()), (-7.25, 4.0, 90.0));
    assert!(viewer.try_recv().is_none());
}

#[tokio::test]
async fn records_are_dropped_while_hub_is_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut relay = relay_to(url);
    assert!(
        !relay
            .relay_line("12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30")
            .await
    );
    assert!(!relay.relay_line("not,a,record").await);

    let snapshot = relay.uplink().stats().snapshot();
    assert_eq!(snapshot.lines_read, 2);
    assert_eq!(snapshot.failures, 1);
    assert_eq!(snapshot.decode_rejected, 1);
}

/// Yields one line, then fails like an unplugged device.
struct Unplugged {
    sent: bool,
}

impl Read for Unplugged {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device removed"));
        }
        self.sent = true;
        let line = b"garbage\n";
        buf[..line.len()].copy_from_slice(line);
        Ok(line.len())
    }
}

#[tokio::test]
async fn transport_fault_ends_the_relay() {
    let (url, _state) = spawn_hub().await;
    let lines = spawn_reader(LineIngestor::new(Unplugged { sent: false }), 4).unwrap();

    let mut relay = relay_to(url);
    let err = relay.run(lines).await.unwrap_err();

    assert!(matches!(err, IngestError::TransportFault(_)));
    assert_eq!(relay.uplink().stats().snapshot().decode_rejected, 1);
}
