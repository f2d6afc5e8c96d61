// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hub configuration.

use crate::echo::EchoPolicy;
use crate::hub::DEFAULT_QUEUE_DEPTH;
use crate::session::DEFAULT_SEND_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Bind address.
    pub bind: String,

    /// HTTP/WebSocket port.
    pub port: u16,

    /// Maximum concurrent viewer connections.
    pub max_clients: usize,

    /// Envelopes buffered per viewer before it is considered stalled.
    pub queue_depth: usize,

    /// Treatment of viewer-submitted messages.
    pub echo: EchoPolicy,

    /// Longest a single socket write may block before the viewer is dropped.
    pub send_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            max_clients: 100,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            echo: EchoPolicy::default(),
            send_timeout_ms: DEFAULT_SEND_TIMEOUT.as_millis() as u64,
        }
    }
}

impl HubConfig {
    /// `bind:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Per-write deadline for viewer sockets.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.is_empty() {
            return Err(ConfigError::Invalid("Empty bind address".into()));
        }
        if self.max_clients == 0 {
            return Err(ConfigError::Invalid("max_clients must be at least 1".into()));
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::Invalid("queue_depth must be at least 1".into()));
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid("send_timeout_ms must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = HubConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HubConfig {
            queue_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HubConfig {
            send_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
