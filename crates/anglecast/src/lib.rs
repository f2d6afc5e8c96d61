// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast - orientation telemetry relay
//!
//! Shared pieces of the relay pipeline:
//!
//! - **Record decoding**: one device CSV line into a [`Record`]
//! - **Wire types**: the uplink payload, hub envelopes and health reply
//!
//! # Pipeline
//!
//! ```text
//! device --serial--> anglecast-bridge --HTTP POST--> anglecast-hub --WebSocket--> viewers
//! ```
//!
//! # Example
//!
//! ```
//! use anglecast::decode_line;
//!
//! let record = decode_line("12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30").unwrap();
//! assert_eq!(record.theta, 12.5);
//! assert_eq!(record.uplink().azraw, 300);
//! ```

pub mod protocol;
pub mod record;

pub use protocol::{
    AngleSample, HealthResponse, IngestReply, IngestRequest, MissingAngles, ServerMessage,
    UpdateData,
};
pub use record::{decode_line, DecodeError, Record, FIELD_COUNT};
