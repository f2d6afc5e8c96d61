// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast hub - fan out orientation telemetry to live viewers.
//!
//! The hub accepts samples pushed by the bridge and re-broadcasts each one to
//! every connected WebSocket viewer.
//!
//! # Endpoints
//!
//! - `POST /api/angles` - push one sample (`theta`, `psi`, `phi`, `axraw`, `ayraw`, `azraw`)
//! - `GET /health` - liveness and viewer count
//! - `GET /ws` - viewer channel (also accepted as an upgrade on `/`)
//! - `GET /` - embedded viewer page

pub mod config;
pub mod echo;
pub mod handlers;
pub mod hub;
pub mod routes;
pub mod session;

pub use config::{ConfigError, HubConfig};
pub use echo::EchoPolicy;
pub use hub::{BroadcastHub, BroadcastReport, SubscriberId, SubscriberState, Subscription};
pub use routes::build_router;

use chrono::{SecondsFormat, Utc};

/// Shared application state
pub struct AppState {
    pub hub: BroadcastHub,
    pub config: HubConfig,
}

impl AppState {
    pub fn new(config: HubConfig) -> Self {
        Self {
            hub: BroadcastHub::new(config.queue_depth),
            config,
        }
    }
}

/// Hub capture time, RFC 3339 UTC with milliseconds.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
