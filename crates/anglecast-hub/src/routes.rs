// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions.

use crate::handlers;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Embedded viewer page served at `/`.
pub const VIEWER_PAGE: &str = include_str!("../static/viewer.html");

/// Ingest and health routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/angles", post(handlers::ingest))
        .route("/api/health", get(handlers::health))
        .route("/health", get(handlers::health))
}

/// Viewer routes: the page and the WebSocket channel
pub fn viewer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(handlers::ws_handler))
}

/// Full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api_routes())
        .merge(viewer_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
