//! Lightweight cumulative counters for the pool.
//!
//! Advisory only: admission decisions never consult these. Downstream can
//! wire the snapshot to whatever metrics sink it likes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use lendbuf_core::error::Error;

#[derive(Default)]
pub struct PoolStats {
    acquisitions: AtomicU64,
    releases: AtomicU64,
    budget_rejections: AtomicU64,
    request_rejections: AtomicU64,
    alloc_failures: AtomicU64,
    peak_outstanding: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn note_acquire(&self, outstanding_now: u64) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.record_outstanding(outstanding_now);
    }

    pub(crate) fn note_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_rejection(&self, err: &Error) {
        match err {
            Error::RequestTooLarge { .. } => {
                self.request_rejections.fetch_add(1, Ordering::Relaxed);
            }
            Error::BudgetExhausted { .. } | Error::SizeOverflow => {
                self.budget_rejections.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub(crate) fn note_alloc_failure(&self) {
        self.alloc_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a new outstanding-bytes value; updates the peak if higher.
    fn record_outstanding(&self, outstanding: u64) {
        let mut cur = self.peak_outstanding.load(Ordering::Relaxed);
        while outstanding > cur {
            match self.peak_outstanding.compare_exchange(
                cur,
                outstanding,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            outstanding,
            peak = self.peak_outstanding.load(Ordering::Relaxed),
            "pool usage"
        );
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            budget_rejections: self.budget_rejections.load(Ordering::Relaxed),
            request_rejections: self.request_rejections.load(Ordering::Relaxed),
            alloc_failures: self.alloc_failures.load(Ordering::Relaxed),
            peak_outstanding_bytes: self.peak_outstanding.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters, safe to serialize or ship elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub acquisitions: u64,
    pub releases: u64,
    pub budget_rejections: u64,
    pub request_rejections: u64,
    pub alloc_failures: u64,
    pub peak_outstanding_bytes: u64,
}
