// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast bridge - relay serial inclinometer lines to the hub.
//!
//! Reads `theta,psi,phi,axraw,ayraw,azraw,axvolt,ayvolt,azvolt` lines from a
//! serial device, decodes them, and pushes the angle and raw fields to the
//! hub's `POST /api/angles` endpoint, one request per record.
//!
//! # Quick Start
//!
//! ```bash
//! # Find the device
//! anglecast-bridge --list
//!
//! # Relay from an Arduino to a local hub
//! anglecast-bridge /dev/ttyACM0 9600
//!
//! # Using a config file
//! anglecast-bridge --config bridge.toml
//! ```
//!
//! # Failure model
//!
//! - Device cannot be opened, or faults after open: fatal, exit status 1.
//! - Device closes the stream: clean exit, status 0.
//! - Malformed line: counted and dropped.
//! - Hub unreachable or rejecting: counted and dropped, no retry.

pub mod config;
pub mod error;
pub mod ingest;
pub mod policy;
pub mod ports;
pub mod relay;
pub mod stats;
pub mod uplink;

pub use config::{BridgeConfig, ConfigError};
pub use error::IngestError;
pub use ingest::{classify, spawn_reader, LineIngestor, LineKind, LINE_CHANNEL_CAPACITY};
pub use policy::FailureLogPolicy;
pub use ports::{list_ports, PortSummary};
pub use relay::{Relay, RelayOutcome};
pub use stats::{SessionStats, SessionStatsSnapshot};
pub use uplink::{DeliveryError, HealthProbe, UplinkTransmitter};
