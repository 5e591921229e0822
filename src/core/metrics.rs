//! Spooler metrics for observability
//!
//! Provides counters for monitoring spooler health: how many items were
//! accepted, delivered, faulted or discarded, and how often the queue drained.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for spooler observability
///
/// # Example
///
/// ```
/// use log_spooler::SpoolerMetrics;
///
/// let metrics = SpoolerMetrics::new();
///
/// metrics.record_submitted();
/// metrics.record_submitted();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.pending(), 1);
/// ```
#[derive(Debug)]
pub struct SpoolerMetrics {
    /// Items accepted by `submit()`
    submitted: AtomicU64,

    /// Items the handler processed without error
    delivered: AtomicU64,

    /// Items whose handler call returned an error or panicked
    faults: AtomicU64,

    /// Items thrown away by `reset()`
    discarded: AtomicU64,

    /// Items refused because the spooler was already disposed
    rejected: AtomicU64,

    /// Number of times the worker observed the queue empty
    drain_cycles: AtomicU64,
}

impl SpoolerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            drain_cycles: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    #[inline]
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Acquire)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Acquire)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Acquire)
    }

    #[inline]
    pub fn drain_cycles(&self) -> u64 {
        self.drain_cycles.load(Ordering::Acquire)
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_fault(&self) -> u64 {
        self.faults.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_drain_cycle(&self) -> u64 {
        self.drain_cycles.fetch_add(1, Ordering::AcqRel)
    }

    /// Items accepted but not yet delivered, faulted or discarded
    ///
    /// Settled counters are read first so the result never underflows.
    pub fn pending(&self) -> u64 {
        let settled = self.delivered() + self.faults() + self.discarded();
        self.submitted().saturating_sub(settled)
    }

    /// Fault rate as a percentage (0.0 - 100.0) of handled items
    ///
    /// Returns 0.0 if nothing has been handled yet.
    pub fn fault_rate(&self) -> f64 {
        let faults = self.faults() as f64;
        let total = self.delivered() as f64 + faults;
        if total == 0.0 {
            0.0
        } else {
            (faults / total) * 100.0
        }
    }
}

impl Default for SpoolerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SpoolerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            delivered: AtomicU64::new(self.delivered()),
            faults: AtomicU64::new(self.faults()),
            discarded: AtomicU64::new(self.discarded()),
            rejected: AtomicU64::new(self.rejected()),
            drain_cycles: AtomicU64::new(self.drain_cycles()),
        }
    }
}
