//! The bounded lending pool: admission, allocation, lease construction.
//!
//! All multi-segment acquisitions flow through here so both configured
//! ceilings hold no matter how the resulting entries are dropped.

use std::sync::Arc;

use lendbuf_core::budget::ByteBudget;
use lendbuf_core::config::PoolConfig;
use lendbuf_core::error::{Error, Result};

use crate::block::Block;
use crate::budget::{ByteBudgetImpl, ByteGrantImpl};
use crate::entry::Entry;
use crate::segments;
use crate::stats::{PoolStats, StatsSnapshot};

pub struct BufferPool<B: ByteBudget> {
    budget: B,
    stats: Arc<PoolStats>,
}

impl<B: ByteBudget<Grant = ByteGrantImpl>> BufferPool<B> {
    pub fn new(budget: B) -> Self {
        Self {
            budget,
            stats: Arc::new(PoolStats::new()),
        }
    }

    /// Acquire one zeroed block carved into `sizes.len()` views.
    ///
    /// On any failure nothing is handed out and the outstanding counter is
    /// unchanged: rejections return before allocation, and a host refusal
    /// rolls the provisional reservation back by dropping the grant.
    pub fn acquire(&self, sizes: &[u64]) -> Result<Entry> {
        let (layout, total) = segments::carve(sizes).map_err(|e| {
            self.stats.note_rejection(&e);
            e
        })?;
        let grant = self.budget.reserve(total).map_err(|e| {
            self.stats.note_rejection(&e);
            e
        })?;
        // carve already checked that the sum is addressable.
        let len = usize::try_from(total).map_err(|_| Error::SizeOverflow)?;
        let block = match Block::zeroed(len) {
            Ok(block) => block,
            Err(e) => {
                // `grant` drops on return, crediting the reservation back.
                self.stats.note_alloc_failure();
                return Err(e);
            }
        };
        self.stats.note_acquire(self.budget.outstanding_bytes());
        Ok(Entry::new(block, layout, grant, Arc::clone(&self.stats)))
    }

    /// Convenience for single-view acquisitions.
    pub fn acquire_one(&self, size: u64) -> Result<Entry> {
        self.acquire(&[size])
    }

    /// Bytes currently out on loan (advisory).
    pub fn outstanding_bytes(&self) -> u64 {
        self.budget.outstanding_bytes()
    }

    pub fn budget(&self) -> &B {
        &self.budget
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl BufferPool<ByteBudgetImpl> {
    /// Build a pool with its own tracker from a validated configuration.
    pub fn with_config(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(ByteBudgetImpl::new(config)))
    }
}
