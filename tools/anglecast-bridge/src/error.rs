// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge error types.

use thiserror::Error;

/// Failures of the device transport. Both are fatal to the bridge.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Cannot open {port} @ {baud} baud: {source}")]
    TransportUnavailable {
        port: String,
        baud: u32,
        #[source]
        source: serialport::Error,
    },

    #[error("Serial transport fault: {0}")]
    TransportFault(#[from] std::io::Error),
}
