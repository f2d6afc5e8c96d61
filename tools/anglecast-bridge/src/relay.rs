// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The bridge relay loop: line -> record -> hub.

use crate::error::IngestError;
use crate::stats::SessionStatsSnapshot;
use crate::uplink::UplinkTransmitter;
use anglecast::{decode_line, Record};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How a relay session ended without a transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The device closed the stream.
    TransportClosed(SessionStatsSnapshot),
}

/// Drives decoded records to the hub in read order.
pub struct Relay {
    uplink: UplinkTransmitter,
    status_interval: Duration,
    last_status: Option<Instant>,
}

impl Relay {
    pub fn new(uplink: UplinkTransmitter, status_interval: Duration) -> Self {
        Self {
            uplink,
            status_interval,
            last_status: None,
        }
    }

    /// Relay lines until the reader closes the channel.
    ///
    /// A transport fault delivered by the reader is returned as the error;
    /// the caller decides the exit status.
    pub async fn run(
        &mut self,
        mut lines: mpsc::Receiver<Result<String, IngestError>>,
    ) -> Result<RelayOutcome, IngestError> {
        while let Some(line) = lines.recv().await {
            let line = line?;
            self.relay_line(&line).await;
        }

        info!("Serial port closed");
        Ok(RelayOutcome::TransportClosed(
            self.uplink.stats().snapshot(),
        ))
    }

    /// Decode and push one line. Returns whether the hub accepted it.
    pub async fn relay_line(&mut self, line: &str) -> bool {
        let stats = self.uplink.stats();
        stats.record_line();

        let record = match decode_line(line) {
            Ok(record) => record,
            Err(e) => {
                stats.record_rejected();
                debug!("Dropping line {:?}: {}", line, e);
                return false;
            }
        };

        let delivered = match self.uplink.send(&record).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Push dropped: {}", e);
                false
            }
        };
        self.report_status(&record);
        delivered
    }

    pub fn uplink(&self) -> &UplinkTransmitter {
        &self.uplink
    }

    /// Status line, at most once per interval.
    fn report_status(&mut self, record: &Record) {
        let now = Instant::now();
        let due = self
            .last_status
            .map_or(true, |last| now.duration_since(last) >= self.status_interval);
        if !due {
            return;
        }
        self.last_status = Some(now);

        info!(
            "{}",
            status_line(
                self.uplink.hub_reachable(),
                record,
                self.uplink.stats().snapshot().relayed
            )
        );
    }
}

fn status_line(hub_reachable: bool, record: &Record, relayed: u64) -> String {
    let link = if hub_reachable {
        "CONNECTED"
    } else {
        "DISCONNECTED"
    };
    format!(
        "[{}] theta={:.2}° psi={:.2}° phi={:.2}° | Packets: {}",
        link, record.theta, record.psi, record.phi, relayed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_shows_hub_link() {
        let record = decode_line("12.5,-3.2,0,100,200,300,1.1,2.2,3.3").unwrap();

        assert_eq!(
            status_line(true, &record, 42),
            "[CONNECTED] theta=12.50° psi=-3.20° phi=0.00° | Packets: 42"
        );
        assert!(status_line(false, &record, 0).starts_with("[DISCONNECTED] "));
    }
}
