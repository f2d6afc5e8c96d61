// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WebSocket viewer session.
//!
//! Each connected viewer gets a session that:
//! - joins the broadcast hub (welcome first, then updates)
//! - forwards queued envelopes to the socket
//! - hands inbound text to the echo policy

use crate::echo::EchoPolicy;
use crate::hub::{BroadcastHub, HubError, Subscription};
use crate::timestamp_now;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Default deadline for one socket write.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A WebSocket viewer session
pub struct ClientSession {
    hub: BroadcastHub,
    echo: EchoPolicy,
    send_timeout: Duration,
}

impl ClientSession {
    /// Create a new viewer session
    pub fn new(hub: BroadcastHub, echo: EchoPolicy) -> Self {
        Self {
            hub,
            echo,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Drop the viewer when a single write blocks longer than `send_timeout`.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Run the session until either side closes.
    ///
    /// The subscriber is removed from the hub when this returns.
    pub async fn run(self, socket: WebSocket) -> Result<(), HubError> {
        let mut subscription = self.hub.subscribe()?;
        let id = subscription.id();
        let (mut ws_tx, mut ws_rx) = socket.split();

        loop {
            tokio::select! {
                outbound = subscription.recv() => match outbound {
                    Some(text) => {
                        let send = ws_tx.send(Message::Text(text.to_string()));
                        match timeout(self.send_timeout, send).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                debug!("[{}] WebSocket send failed, closing: {}", id, e);
                                break;
                            }
                            Err(_) => {
                                warn!("[{}] WebSocket send stalled, closing", id);
                                break;
                            }
                        }
                    }
                    None => {
                        debug!("[{}] Dropped by hub", id);
                        break;
                    }
                },
                inbound = ws_rx.next() => match inbound {
                    Some(Ok(Message::Text(text))) => self.handle_inbound(&subscription, &text),
                    Some(Ok(Message::Close(_))) | None => {
                        info!("[{}] Viewer closed connection", id);
                        break;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Axum answers pings itself
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("[{}] Pong received", id);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("[{}] Binary messages not supported", id);
                    }
                    Some(Err(e)) => {
                        error!("[{}] WebSocket error: {}", id, e);
                        break;
                    }
                },
            }
        }

        drop(subscription);
        let _ = timeout(self.send_timeout, ws_tx.close()).await;
        info!("[{}] Session ended", id);

        Ok(())
    }

    /// Apply the echo policy to one inbound text message.
    fn handle_inbound(&self, subscription: &Subscription, text: &str) {
        let id = subscription.id();
        match self.echo.envelope(text, timestamp_now()) {
            Ok(Some(envelope)) => {
                debug!("[{}] Echoing viewer message", id);
                if let Err(e) = self.hub.broadcast(&envelope) {
                    error!("[{}] Echo broadcast failed: {}", id, e);
                }
            }
            Ok(None) => debug!("[{}] Viewer message ignored", id),
            Err(e) => warn!("[{}] Dropping viewer message: {}", id, e),
        }
    }
}
