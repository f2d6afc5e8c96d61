// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge session counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one bridge run. Monotonic; reset only on restart.
#[derive(Debug)]
pub struct SessionStats {
    /// Data lines handed over by the ingestor.
    pub lines_read: AtomicU64,

    /// Lines the decoder refused.
    pub decode_rejected: AtomicU64,

    /// Records the hub accepted.
    pub relayed: AtomicU64,

    /// Pushes that failed (bad status or transport).
    pub failures: AtomicU64,

    /// Session start time.
    pub created: Instant,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            lines_read: AtomicU64::new(0),
            decode_rejected: AtomicU64::new(0),
            relayed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.decode_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the relayed count including this record.
    pub fn record_relayed(&self) -> u64 {
        self.relayed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            decode_rejected: self.decode_rejected.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs(),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatsSnapshot {
    pub lines_read: u64,
    pub decode_rejected: u64,
    pub relayed: u64,
    pub failures: u64,
    pub uptime_secs: u64,
}

impl SessionStatsSnapshot {
    /// Records relayed per second over the session.
    pub fn packets_per_second(&self) -> f64 {
        if self.uptime_secs > 0 {
            self.relayed as f64 / self.uptime_secs as f64
        } else {
            0.0
        }
    }
}
