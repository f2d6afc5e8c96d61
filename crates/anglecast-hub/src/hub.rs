// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broadcast hub - the live subscriber set and envelope fan-out.
//!
//! Each subscriber is a bounded outbound queue drained by its WebSocket
//! session. The hub never awaits a subscriber: delivery is a non-blocking
//! enqueue, and a subscriber whose queue is closed or full is dropped from
//! the set without affecting the others.
//!
//! Lifecycle per subscriber:
//!
//! ```text
//! register()        open()                 remove() / send failure
//! ----------> Connecting ------> Open -------------------------------> Closed
//!                       (welcome queued)
//! ```

use anglecast::ServerMessage;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A serialized envelope, shared by every subscriber of one broadcast.
pub type Outbound = Arc<str>;

/// Default per-subscriber queue depth.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Connection id of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form for log prefixes.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// Subscriber lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Connecting,
    Open,
    Closed,
}

/// Why an envelope could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendFailure {
    #[error("subscriber queue closed")]
    Closed,

    #[error("subscriber queue full")]
    Full,
}

impl<T> From<TrySendError<T>> for SendFailure {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::Full,
            TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Hub errors.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("unknown subscriber {0}")]
    UnknownSubscriber(SubscriberId),

    #[error("subscriber {id} cannot open from state {state:?}")]
    InvalidTransition {
        id: SubscriberId,
        state: SubscriberState,
    },

    #[error("welcome to subscriber {id} failed: {reason}")]
    Welcome {
        id: SubscriberId,
        reason: SendFailure,
    },

    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one [`BroadcastHub::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the envelope was queued for.
    pub delivered: usize,
    /// Subscribers removed because delivery failed.
    pub dropped: usize,
    /// Subscribers not yet open.
    pub skipped: usize,
}

struct Subscriber {
    state: SubscriberState,
    tx: mpsc::Sender<Outbound>,
}

/// Hub counters.
#[derive(Debug)]
pub struct HubStats {
    pub broadcasts: AtomicU64,
    pub deliveries: AtomicU64,
    pub send_failures: AtomicU64,
    pub created: Instant,
}

impl HubStats {
    fn new() -> Self {
        Self {
            broadcasts: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs(),
        }
    }
}

/// Snapshot of hub counters.
#[derive(Debug, Clone, Copy)]
pub struct HubStatsSnapshot {
    pub broadcasts: u64,
    pub deliveries: u64,
    pub send_failures: u64,
    pub uptime_secs: u64,
}

struct HubInner {
    subscribers: DashMap<SubscriberId, Subscriber>,
    queue_depth: usize,
    stats: HubStats,
}

/// The subscriber set and fan-out. Cheap to clone; clones share the set.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl BroadcastHub {
    /// Create a hub whose subscribers buffer at most `queue_depth` envelopes.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: DashMap::new(),
                queue_depth: queue_depth.max(1),
                stats: HubStats::new(),
            }),
        }
    }

    /// Add a subscriber in the `Connecting` state.
    pub fn register(&self) -> Subscription {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(self.inner.queue_depth);
        self.inner.subscribers.insert(
            id,
            Subscriber {
                state: SubscriberState::Connecting,
                tx,
            },
        );
        debug!("[{}] Subscriber registered", id);

        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    /// Move a subscriber to `Open`, queueing the welcome envelope first.
    ///
    /// The welcome is enqueued while the entry is locked, so no broadcast can
    /// reach the subscriber ahead of it.
    pub fn open(&self, id: SubscriberId) -> Result<(), HubError> {
        let welcome: Outbound = serde_json::to_string(&ServerMessage::welcome())?.into();

        let mut entry = self
            .inner
            .subscribers
            .get_mut(&id)
            .ok_or(HubError::UnknownSubscriber(id))?;

        if entry.state != SubscriberState::Connecting {
            return Err(HubError::InvalidTransition {
                id,
                state: entry.state,
            });
        }

        if let Err(e) = entry.tx.try_send(welcome) {
            drop(entry);
            self.remove(id);
            return Err(HubError::Welcome {
                id,
                reason: e.into(),
            });
        }

        entry.state = SubscriberState::Open;
        drop(entry);

        info!("[{}] Subscriber open. Total: {}", id, self.subscriber_count());
        Ok(())
    }

    /// Register and open in one step.
    pub fn subscribe(&self) -> Result<Subscription, HubError> {
        let subscription = self.register();
        self.open(subscription.id)?;
        Ok(subscription)
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.inner.subscribers.remove(&id).is_some();
        if removed {
            info!(
                "[{}] Subscriber closed. Total: {}",
                id,
                self.subscriber_count()
            );
        }
        removed
    }

    /// Current state of a subscriber; absent subscribers are `Closed`.
    pub fn state(&self, id: SubscriberId) -> SubscriberState {
        self.inner
            .subscribers
            .get(&id)
            .map(|s| s.state)
            .unwrap_or(SubscriberState::Closed)
    }

    /// Number of open subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .iter()
            .filter(|s| s.state == SubscriberState::Open)
            .count()
    }

    /// Number of connections held, open or still connecting.
    pub fn connection_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Fan an envelope out to every open subscriber.
    ///
    /// Subscribers whose queue is closed or full are removed after the pass.
    pub fn broadcast(&self, message: &ServerMessage) -> Result<BroadcastReport, HubError> {
        let text: Outbound = serde_json::to_string(message)?.into();
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        for entry in self.inner.subscribers.iter() {
            if entry.state != SubscriberState::Open {
                report.skipped += 1;
                continue;
            }
            match entry.tx.try_send(text.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => failed.push((*entry.key(), SendFailure::from(e))),
            }
        }

        // Removal takes shard write locks; do it after iteration released them.
        for (id, reason) in failed {
            warn!("[{}] Dropping subscriber: {}", id, reason);
            if self.remove(id) {
                report.dropped += 1;
            }
        }

        let stats = &self.inner.stats;
        stats.broadcasts.fetch_add(1, Ordering::Relaxed);
        stats
            .deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        stats
            .send_failures
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        Ok(report)
    }

    /// Hub counters.
    pub fn stats(&self) -> HubStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

/// Receiving end of one subscriber. Dropping it removes the subscriber.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Outbound>,
    hub: BroadcastHub,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next queued envelope; `None` once the hub has dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }

    /// Next queued envelope without waiting.
    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.remove(self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
