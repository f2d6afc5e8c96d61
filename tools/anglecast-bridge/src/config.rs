// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration.
//!
//! Loaded from an optional TOML file; command-line flags override it.
//!
//! ```toml
//! port = "/dev/ttyACM0"
//! baud_rate = 9600
//! hub_url = "http://localhost:3000"
//! failure_log_every = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Serial device path (e.g. "/dev/ttyACM0", "COM3").
    pub port: String,

    /// Serial baud rate.
    pub baud_rate: u32,

    /// Base URL of the hub.
    pub hub_url: String,

    /// Per-request timeout for pushes to the hub (milliseconds).
    pub request_timeout_ms: u64,

    /// Serial read timeout (milliseconds). Timeouts are not errors.
    pub read_timeout_ms: u64,

    /// Log the 1st and then every Nth consecutive unreachable-hub failure.
    pub failure_log_every: u32,

    /// Minimum spacing of status lines (milliseconds).
    pub status_interval_ms: u64,

    /// Log level.
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            hub_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 5000,
            read_timeout_ms: 100,
            failure_log_every: 10,
            status_interval_ms: 1000,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("Empty serial port".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("Baud rate must be positive".into()));
        }
        if self.failure_log_every == 0 {
            return Err(ConfigError::Invalid(
                "failure_log_every must be at least 1".into(),
            ));
        }

        let url = reqwest::Url::parse(&self.hub_url)
            .map_err(|e| ConfigError::Invalid(format!("Bad hub URL '{}': {}", self.hub_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "Hub URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }

    /// `POST` target for samples.
    pub fn ingest_url(&self) -> String {
        format!("{}/api/angles", self.hub_url.trim_end_matches('/'))
    }

    /// `GET` target for the startup health probe.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.hub_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}
