// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire types shared by the bridge, the hub and viewers.
//!
//! All messages are JSON. Bridge -> hub:
//!
//! ```json
//! {"theta": 12.5, "psi": -3.2, "phi": 0.0, "axraw": 100, "ayraw": 200, "azraw": 300}
//! ```
//!
//! Hub -> viewer:
//!
//! ```json
//! {"type": "connection", "message": "Connected to angle data server"}
//! {"type": "angle_update", "timestamp": "2026-01-01T00:00:00.000Z", "connected": true,
//!  "data": {"theta": 12.5, "psi": -3.2, "phi": 0.0, "axraw": 100, "ayraw": 200, "azraw": 300}}
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Greeting carried by the one-time connection envelope.
pub const WELCOME_MESSAGE: &str = "Connected to angle data server";

/// Error message returned when a push carries no angle at all.
pub const MISSING_ANGLES: &str = "Missing angle data";

/// The six fields relayed past the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngleSample {
    pub theta: f64,
    pub psi: f64,
    pub phi: f64,
    pub axraw: i64,
    pub ayraw: i64,
    pub azraw: i64,
}

/// Lenient form of [`AngleSample`] accepted by the hub.
///
/// Every field is optional; absent or `null` fields become zero. Raw samples
/// may arrive as floats and are truncated toward zero.
///
/// Angles keep presence apart from value: `None` means the key was left out,
/// `Some(None)` means it was sent as `null`. A `null` angle still counts as
/// present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default, deserialize_with = "present")]
    pub theta: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub psi: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub phi: Option<Option<f64>>,
    #[serde(default)]
    pub axraw: Option<f64>,
    #[serde(default)]
    pub ayraw: Option<f64>,
    #[serde(default)]
    pub azraw: Option<f64>,
}

/// Only called for keys that appear in the body, so `null` lands as `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// All three angles were absent from a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Missing angle data")]
pub struct MissingAngles;

impl IngestRequest {
    /// True if at least one of `theta`, `psi`, `phi` is present, even as `null`.
    pub fn has_angles(&self) -> bool {
        self.theta.is_some() || self.psi.is_some() || self.phi.is_some()
    }

    /// Coerce absent fields to zero, or reject a request with no angles.
    pub fn normalize(&self) -> Result<AngleSample, MissingAngles> {
        if !self.has_angles() {
            return Err(MissingAngles);
        }

        Ok(AngleSample {
            theta: self.theta.flatten().unwrap_or(0.0),
            psi: self.psi.flatten().unwrap_or(0.0),
            phi: self.phi.flatten().unwrap_or(0.0),
            axraw: self.axraw.map(truncate).unwrap_or(0),
            ayraw: self.ayraw.map(truncate).unwrap_or(0),
            azraw: self.azraw.map(truncate).unwrap_or(0),
        })
    }
}

fn truncate(v: f64) -> i64 {
    // `as` saturates and maps NaN to 0.
    v.trunc() as i64
}

/// Reply body of the ingest endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReply {
    pub status: String,
    pub message: String,
}

impl IngestReply {
    pub fn success() -> Self {
        Self {
            status: "success".into(),
            message: "Data received".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Payload of an `angle_update` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateData {
    /// A normalized sample from the uplink or a validated viewer echo.
    Sample(AngleSample),
    /// A viewer message passed through verbatim.
    Raw(serde_json::Value),
}

/// Hub -> viewer envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when a subscriber opens.
    Connection { message: String },

    /// Sent for every accepted record.
    AngleUpdate {
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connected: Option<bool>,
        data: UpdateData,
    },
}

impl ServerMessage {
    /// The connection acknowledgement.
    pub fn welcome() -> Self {
        Self::Connection {
            message: WELCOME_MESSAGE.to_string(),
        }
    }

    /// An update originating from the trusted uplink.
    pub fn angle_update(timestamp: impl Into<String>, sample: AngleSample) -> Self {
        Self::AngleUpdate {
            timestamp: timestamp.into(),
            connected: Some(true),
            data: UpdateData::Sample(sample),
        }
    }

    /// An update echoed from a viewer.
    pub fn echo(timestamp: impl Into<String>, data: UpdateData) -> Self {
        Self::AngleUpdate {
            timestamp: timestamp.into(),
            connected: None,
            data,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub clients: usize,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub uptime_secs: u64,
    #[serde(default)]
    pub broadcasts: u64,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
