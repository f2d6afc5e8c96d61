// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delivery of decoded records to the hub.
//!
//! Every record is attempted exactly once. Failures are counted and reported
//! to the caller; nothing is queued or retried.

use crate::config::BridgeConfig;
use crate::policy::FailureLogPolicy;
use crate::stats::SessionStats;
use anglecast::{HealthResponse, Record};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a push did not land.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Hub returned {0}")]
    Status(StatusCode),

    #[error("Could not reach hub: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Outcome of the startup health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthProbe {
    /// Hub answered; `clients` is absent when the body was not understood.
    Reachable { clients: Option<usize> },
    BadStatus(StatusCode),
    Unreachable(String),
}

impl HealthProbe {
    pub fn is_reachable(&self) -> bool {
        matches!(self, HealthProbe::Reachable { .. })
    }
}

/// HTTP client for the hub's ingest endpoint.
pub struct UplinkTransmitter {
    client: reqwest::Client,
    ingest_url: String,
    health_url: String,
    policy: FailureLogPolicy,
    stats: Arc<SessionStats>,
    hub_reachable: AtomicBool,
}

impl UplinkTransmitter {
    pub fn new(config: &BridgeConfig, stats: Arc<SessionStats>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            ingest_url: config.ingest_url(),
            health_url: config.health_url(),
            policy: FailureLogPolicy::new(config.failure_log_every),
            stats,
            hub_reachable: AtomicBool::new(false),
        })
    }

    /// Push the six angle/raw fields of `record`. Voltages stay local.
    pub async fn send(&self, record: &Record) -> Result<(), DeliveryError> {
        let payload = record.uplink();

        let response = match self.client.post(&self.ingest_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_failure();
                self.hub_reachable.store(false, Ordering::Relaxed);
                if let Some(streak) = self.policy.on_failure() {
                    warn!("Could not reach hub ({} consecutive): {}", streak, e);
                }
                return Err(DeliveryError::Transport(e));
            }
        };

        // The hub answered, so any outage is over.
        let outage = self.policy.on_success();
        if outage > 0 {
            info!("Hub reachable again after {} failed push(es)", outage);
        }
        self.hub_reachable.store(true, Ordering::Relaxed);

        let status = response.status();
        if !status.is_success() {
            self.stats.record_failure();
            warn!("Hub rejected push: {}", status);
            return Err(DeliveryError::Status(status));
        }

        self.stats.record_relayed();
        Ok(())
    }

    /// One `GET /health`, logged for the operator. Never fails.
    pub async fn probe_health(&self) -> HealthProbe {
        let probe = match self.client.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => {
                let clients = match response.json::<HealthResponse>().await {
                    Ok(health) => Some(health.clients),
                    Err(e) => {
                        debug!("Unexpected health body: {}", e);
                        None
                    }
                };
                HealthProbe::Reachable { clients }
            }
            Ok(response) => HealthProbe::BadStatus(response.status()),
            Err(e) => HealthProbe::Unreachable(e.to_string()),
        };

        match &probe {
            HealthProbe::Reachable {
                clients: Some(clients),
            } => info!("Hub is reachable ({} viewer(s) connected)", clients),
            HealthProbe::Reachable { clients: None } => info!("Hub is reachable"),
            HealthProbe::BadStatus(status) => {
                warn!("Hub health check returned {}", status);
                warn!("Make sure the hub is running: anglecast-hub");
            }
            HealthProbe::Unreachable(reason) => {
                warn!("Hub not reachable: {}", reason);
                warn!("Make sure the hub is running: anglecast-hub");
            }
        }

        self.hub_reachable
            .store(probe.is_reachable(), Ordering::Relaxed);
        probe
    }

    /// Whether the last exchange with the hub got an answer.
    pub fn hub_reachable(&self) -> bool {
        self.hub_reachable.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> &Arc<SessionStats> {
        &self.stats
    }

    /// Current run of consecutive transport failures.
    pub fn failure_streak(&self) -> u64 {
        self.policy.streak()
    }
}
