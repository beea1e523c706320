//! Statistics for the signaling server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Relay counters, updated on every fan-out
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Join notifications broadcast
    joins: AtomicU64,
    /// Leave notifications broadcast
    leaves: AtomicU64,
    /// Chat messages relayed
    chats: AtomicU64,
    /// Individual deliveries accepted by a recipient's outbox
    delivered: AtomicU64,
    /// Individual deliveries dropped because the recipient was gone
    dropped: AtomicU64,
}

/// Kind of relayed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Join,
    Leave,
    Chat,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one broadcast and its per-recipient outcome
    pub fn record(&self, kind: RelayKind, delivered: usize, dropped: usize) {
        let counter = match kind {
            RelayKind::Join => &self.joins,
            RelayKind::Leave => &self.leaves,
            RelayKind::Chat => &self.chats,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    /// Take a consistent-enough copy of the counters
    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            joins: self.joins.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
            chats: self.chats.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `RelayStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub joins: u64,
    pub leaves: u64,
    pub chats: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// Server-wide statistics
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever
    pub total_connections: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Rooms with at least one member
    pub active_rooms: u64,
    /// Relay counters
    pub relay: RelaySnapshot,
    /// Uptime
    pub uptime: Duration,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Connection counters kept by the listener
#[derive(Debug)]
pub struct ConnectionCounters {
    total: AtomicU64,
    active: AtomicU64,
    started_at: Instant,
}

impl ConnectionCounters {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            active: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// A connection was accepted
    pub fn opened(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    /// An accepted connection finished
    pub fn closed(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for ConnectionCounters {
    fn default() -> Self {
        Self::new()
    }
}
