//! Counters for the emit and dispatch paths
//!
//! Every silent rejection is counted here so that dropped traffic stays
//! observable without surfacing errors to callers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for one registry
#[derive(Debug, Default)]
pub struct Metrics {
    /// Envelopes handed to the transport
    pub emitted: AtomicU64,
    /// Emits dropped before reaching the transport (unknown id, bad payload)
    pub emit_rejected: AtomicU64,
    /// Raw inbound messages seen by the dispatcher
    pub received: AtomicU64,
    /// Inbound messages dropped (foreign, malformed, unknown id)
    pub dropped: AtomicU64,
    /// Total listener callbacks invoked
    pub listener_calls: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emit_rejected(&self) {
        self.emit_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed dispatch pass that invoked `calls` listeners
    pub fn record_listener_calls(&self, calls: usize) {
        self.listener_calls.fetch_add(calls as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            emitted: self.emitted.load(Ordering::Relaxed),
            emit_rejected: self.emit_rejected.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            listener_calls: self.listener_calls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub emitted: u64,
    pub emit_rejected: u64,
    pub received: u64,
    pub dropped: u64,
    pub listener_calls: u64,
}
