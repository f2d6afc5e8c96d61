// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handling of messages pushed by viewers.
//!
//! Viewers share the broadcast channel with the trusted uplink, so anything
//! they send is gated by an [`EchoPolicy`] before it can reach other viewers.

use anglecast::{IngestRequest, ServerMessage, UpdateData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with text a viewer sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EchoPolicy {
    /// Ignore viewer messages.
    Off,
    /// Re-broadcast only messages that normalize to an angle sample.
    #[default]
    Validated,
    /// Re-broadcast any JSON value verbatim.
    Raw,
}

/// A viewer message that was not re-broadcast.
#[derive(Debug, Error)]
pub enum EchoRejected {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    MissingAngles(#[from] anglecast::MissingAngles),
}

impl EchoPolicy {
    /// Build the envelope to re-broadcast for `text`, if any.
    pub fn envelope(
        self,
        text: &str,
        timestamp: impl Into<String>,
    ) -> Result<Option<ServerMessage>, EchoRejected> {
        let data = match self {
            Self::Off => return Ok(None),
            Self::Validated => {
                let request: IngestRequest = serde_json::from_str(text)?;
                UpdateData::Sample(request.normalize()?)
            }
            Self::Raw => UpdateData::Raw(serde_json::from_str(text)?),
        };

        Ok(Some(ServerMessage::echo(timestamp, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_ignores_everything() {
        let out = EchoPolicy::Off.envelope(r#"{"theta": 1}"#, "t").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn validated_normalizes_sample() {
        let out = EchoPolicy::Validated
            .envelope(r#"{"theta": 1.5, "axraw": 512}"#, "t")
            .unwrap()
            .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "angle_update");
        assert_eq!(json["data"]["theta"], 1.5);
        assert_eq!(json["data"]["phi"], 0.0);
        assert_eq!(json["data"]["axraw"], 512);
        assert!(json.get("connected").is_none());
    }

    #[test]
    fn validated_rejects_foreign_shapes() {
        assert!(matches!(
            EchoPolicy::Validated.envelope(r#"{"hello": "world"}"#, "t"),
            Err(EchoRejected::MissingAngles(_))
        ));
        assert!(matches!(
            EchoPolicy::Validated.envelope("not json", "t"),
            Err(EchoRejected::Json(_))
        ));
    }

    #[test]
    fn raw_passes_any_json_through() {
        let out = EchoPolicy::Raw
            .envelope(r#"{"hello": "world"}"#, "t")
            .unwrap()
            .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["data"]["hello"], "world");

        assert!(EchoPolicy::Raw.envelope("{broken", "t").is_err());
    }
}
