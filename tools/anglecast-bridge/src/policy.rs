// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rate limiting for repeated delivery diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Decides which consecutive transport failures get logged.
///
/// The first failure of an outage is always reported, then every `every`th
/// one after it (1st, 11th, 21st ... with the default of 10). A success ends
/// the outage.
#[derive(Debug)]
pub struct FailureLogPolicy {
    every: u64,
    streak: AtomicU64,
}

impl FailureLogPolicy {
    pub const DEFAULT_EVERY: u32 = 10;

    pub fn new(every: u32) -> Self {
        Self {
            every: u64::from(every.max(1)),
            streak: AtomicU64::new(0),
        }
    }

    /// Record a failure. Returns the streak length when it should be logged.
    pub fn on_failure(&self) -> Option<u64> {
        let n = self.streak.fetch_add(1, Ordering::Relaxed) + 1;
        ((n - 1) % self.every == 0).then_some(n)
    }

    /// Record a success. Returns the length of the outage that just ended.
    pub fn on_success(&self) -> u64 {
        self.streak.swap(0, Ordering::Relaxed)
    }

    /// Current consecutive failure count.
    pub fn streak(&self) -> u64 {
        self.streak.load(Ordering::Relaxed)
    }
}

impl Default for FailureLogPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged(policy: &FailureLogPolicy, failures: usize) -> Vec<u64> {
        (0..failures).filter_map(|_| policy.on_failure()).collect()
    }

    #[test]
    fn logs_first_then_every_tenth() {
        let policy = FailureLogPolicy::default();
        assert_eq!(logged(&policy, 25), vec![1, 11, 21]);
        assert_eq!(policy.streak(), 25);
    }

    #[test]
    fn success_starts_a_new_outage() {
        let policy = FailureLogPolicy::new(10);
        assert_eq!(logged(&policy, 3), vec![1]);
        assert_eq!(policy.on_success(), 3);
        assert_eq!(policy.streak(), 0);
        assert_eq!(logged(&policy, 2), vec![1]);
    }

    #[test]
    fn every_one_logs_everything() {
        let policy = FailureLogPolicy::new(1);
        assert_eq!(logged(&policy, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_is_treated_as_one() {
        let policy = FailureLogPolicy::new(0);
        assert_eq!(logged(&policy, 2), vec![1, 2]);
    }
}
