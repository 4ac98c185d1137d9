//! ByteBudget + RAII grant implementations.
//!
//! The pool must *always* hold a grant before allocating a block. Dropping
//! the grant credits the bytes back to the budget (panic-safe).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lendbuf_core::budget::{ByteBudget, ByteGrant};
use lendbuf_core::config::PoolConfig;
use lendbuf_core::error::{Error, Result};

/// Shared inner state for the budget.
struct BudgetInner {
    capacity: u64,
    max_request: u64,
    outstanding: AtomicU64,
}

impl BudgetInner {
    fn new(capacity: u64, max_request: u64) -> Self {
        Self {
            capacity,
            max_request,
            outstanding: AtomicU64::new(0),
        }
    }

    /// Admission is one atomic step: the ceiling check and the increment
    /// either both happen or neither does. Rejections leave the counter
    /// untouched.
    fn try_reserve(&self, bytes: u64) -> Result<()> {
        if bytes > self.max_request {
            return Err(Error::RequestTooLarge {
                requested: bytes,
                max_request: self.max_request,
            });
        }
        loop {
            let cur = self.outstanding.load(Ordering::Relaxed);
            let next = cur.saturating_add(bytes);
            if next > self.capacity {
                return Err(Error::BudgetExhausted {
                    requested: bytes,
                    outstanding: cur,
                    capacity: self.capacity,
                });
            }
            if self
                .outstanding
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    /// Credit `bytes` back. The counter is floored at zero: crediting more
    /// than is outstanding means a grant was double-counted somewhere, which
    /// is fatal in debug builds and clamped (loudly) in release builds.
    /// Returns false when the clamp fired.
    fn release(&self, bytes: u64) -> bool {
        loop {
            let cur = self.outstanding.load(Ordering::Relaxed);
            let (next, clean) = match cur.checked_sub(bytes) {
                Some(next) => (next, true),
                None => {
                    debug_assert!(
                        false,
                        "outstanding-bytes underflow: credited {bytes} with {cur} outstanding"
                    );
                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        credited = bytes,
                        outstanding = cur,
                        "outstanding-bytes underflow; clamping to zero"
                    );
                    (0, false)
                }
            };
            if self
                .outstanding
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return clean;
            }
        }
    }
}

/// Concrete ByteBudget implementation used by the pool.
#[derive(Clone)]
pub struct ByteBudgetImpl {
    inner: Arc<BudgetInner>,
}

impl ByteBudgetImpl {
    /// Build a budget from the two configured ceilings. The ceilings are
    /// taken as given; construct the config through `PoolConfig::new` (or
    /// call `validate`) to reject out-of-range values first.
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            inner: Arc::new(BudgetInner::new(
                config.max_total_bytes,
                config.max_request_bytes,
            )),
        }
    }
}

/// RAII grant that accounts for a number of bytes.
/// Dropping it credits the bytes back to the budget.
pub struct ByteGrantImpl {
    inner: Arc<BudgetInner>,
    bytes: u64,
}

impl ByteGrantImpl {
    /// Credit the budget now instead of waiting for Drop. Returns false if
    /// the counter underflowed and was clamped.
    pub(crate) fn settle(mut self) -> bool {
        if self.bytes == 0 {
            return true;
        }
        let clean = self.inner.release(self.bytes);
        self.bytes = 0;
        clean
    }
}

impl Drop for ByteGrantImpl {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.inner.release(self.bytes);
            // NOTE: do not log here to keep the drop path fast.
            self.bytes = 0;
        }
    }
}

impl fmt::Debug for ByteGrantImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteGrantImpl")
            .field("bytes", &self.bytes)
            .finish()
    }
}

// ----- trait impls -----

impl ByteGrant for ByteGrantImpl {
    fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl ByteBudget for ByteBudgetImpl {
    type Grant = ByteGrantImpl;

    fn reserve(&self, bytes: u64) -> Result<Self::Grant> {
        if bytes == 0 {
            // Degenerate requests are admitted without touching the counter.
            return Ok(ByteGrantImpl {
                inner: Arc::clone(&self.inner),
                bytes: 0,
            });
        }
        match self.inner.try_reserve(bytes) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    bytes,
                    outstanding = self.inner.outstanding.load(Ordering::Relaxed),
                    "bytes reserved"
                );
                Ok(ByteGrantImpl {
                    inner: Arc::clone(&self.inner),
                    bytes,
                })
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(bytes, %e, "reservation rejected");
                Err(e)
            }
        }
    }

    fn capacity_bytes(&self) -> u64 {
        self.inner.capacity
    }

    fn max_request_bytes(&self) -> u64 {
        self.inner.max_request
    }

    fn outstanding_bytes(&self) -> u64 {
        self.inner.outstanding.load(Ordering::Relaxed)
    }
}
