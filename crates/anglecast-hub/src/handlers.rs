// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers.

use crate::session::ClientSession;
use crate::{timestamp_now, AppState};
use anglecast::{HealthResponse, IngestReply, IngestRequest, MissingAngles, ServerMessage};
use axum::{
    extract::{rejection::JsonRejection, ws::WebSocket, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Reasons a push to the ingest endpoint is refused.
#[derive(Debug, Error)]
pub enum IngestRejection {
    #[error("{0}")]
    MissingAngles(#[from] MissingAngles),

    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl IntoResponse for IngestRejection {
    fn into_response(self) -> Response {
        warn!("Rejected push: {}", self);
        (StatusCode::BAD_REQUEST, Json(IngestReply::error(self.to_string()))).into_response()
    }
}

/// POST /api/angles
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestReply>, IngestRejection> {
    let Json(request) = payload?;
    let sample = request.normalize()?;

    let envelope = ServerMessage::angle_update(timestamp_now(), sample);

    // Subscriber failures never change the reply.
    match state.hub.broadcast(&envelope) {
        Ok(report) => debug!(
            "Broadcast theta={:.2} psi={:.2} phi={:.2} to {} viewer(s), {} dropped",
            sample.theta, sample.psi, sample.phi, report.delivered, report.dropped
        ),
        Err(e) => error!("Broadcast failed: {}", e),
    }

    Ok(Json(IngestReply::success()))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.hub.stats();

    Json(HealthResponse {
        status: "ok".to_string(),
        clients: state.hub.subscriber_count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: stats.uptime_secs,
        broadcasts: stats.broadcasts,
    })
}

/// GET /ws - WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    upgrade(ws, state)
}

/// GET / - viewer page, or a WebSocket upgrade when requested
pub async fn index(
    ws: Option<WebSocketUpgrade>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Some(ws) => upgrade(ws, state),
        None => Html(crate::routes::VIEWER_PAGE).into_response(),
    }
}

fn upgrade(ws: WebSocketUpgrade, state: Arc<AppState>) -> Response {
    if state.hub.connection_count() >= state.config.max_clients {
        warn!("Connection rejected: max clients reached");
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session = ClientSession::new(state.hub.clone(), state.config.echo)
        .with_send_timeout(state.config.send_timeout());

    if let Err(e) = session.run(socket).await {
        error!("Session error: {}", e);
    }
}
