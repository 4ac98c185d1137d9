//! Lease entries and the release protocol.
//!
//! An entry owns one block plus the carved segment layout. Release happens
//! exactly once no matter how many triggers fire: the explicit `release`
//! call and the Drop fallback both funnel through one routine guarded by an
//! atomic flag, so a finalizer-driven duplicate is a harmless no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lendbuf_core::error::{Error, Result};

use crate::block::Block;
use crate::budget::ByteGrantImpl;
use crate::segments::Segment;
use crate::stats::PoolStats;

/// A live lease on one contiguous block, carved into caller-visible views.
pub struct Entry {
    block: Block,
    segments: Vec<Segment>,
    grant: Option<ByteGrantImpl>,
    released: AtomicBool,
    stats: Arc<PoolStats>,
}

impl Entry {
    // Only the pool may construct entries: `segments` must tile `block`
    // exactly, which `segments::carve` guarantees.
    pub(crate) fn new(
        block: Block,
        segments: Vec<Segment>,
        grant: ByteGrantImpl,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            block,
            segments,
            grant: Some(grant),
            released: AtomicBool::new(false),
            stats,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of carved views. Zero once the entry has been released.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total block size in bytes. Zero once the entry has been released.
    pub fn total_len(&self) -> usize {
        self.block.len()
    }

    /// The whole contiguous region; segment views are carved out of this.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        if self.is_released() {
            return Err(Error::AlreadyReleased);
        }
        Ok(self.block.as_slice())
    }

    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        if self.is_released() {
            return Err(Error::AlreadyReleased);
        }
        Ok(self.block.as_mut_slice())
    }

    /// Borrow the view at `index` read-only.
    pub fn view(&self, index: usize) -> Result<&[u8]> {
        if self.is_released() {
            return Err(Error::AlreadyReleased);
        }
        let seg = self
            .segments
            .get(index)
            .copied()
            .ok_or(Error::SegmentOutOfRange {
                index,
                count: self.segments.len(),
            })?;
        Ok(&self.block.as_slice()[seg.offset..seg.end()])
    }

    /// Borrow the view at `index` mutably.
    pub fn view_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        if self.is_released() {
            return Err(Error::AlreadyReleased);
        }
        let seg = self
            .segments
            .get(index)
            .copied()
            .ok_or(Error::SegmentOutOfRange {
                index,
                count: self.segments.len(),
            })?;
        Ok(&mut self.block.as_mut_slice()[seg.offset..seg.end()])
    }

    /// Borrow every view mutably at once, in request order. The slices are
    /// disjoint, so the caller can hand them to independent writers.
    pub fn views_mut(&mut self) -> Result<Vec<&mut [u8]>> {
        if self.is_released() {
            return Err(Error::AlreadyReleased);
        }
        let mut views = Vec::with_capacity(self.segments.len());
        // Segments tile the block in order, so a split walk yields exactly
        // the carved layout.
        let mut rest = self.block.as_mut_slice();
        for seg in &self.segments {
            let (head, tail) = rest.split_at_mut(seg.len);
            views.push(head);
            rest = tail;
        }
        Ok(views)
    }

    /// Return this entry's bytes to the pool.
    ///
    /// Safe to call more than once: the first trigger (this call or the Drop
    /// fallback, whichever comes first) does the work, later ones are no-ops
    /// that return `Ok`.
    pub fn release(&mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Free the region before crediting the budget, so admitted bytes are
        // never backed by memory the host has not reclaimed yet.
        self.block = Block::empty();
        let clean = match self.grant.take() {
            Some(grant) => grant.settle(),
            None => true,
        };
        self.segments.clear();
        self.stats.note_release();
        if clean {
            Ok(())
        } else {
            Err(Error::ReleaseAccounting(
                "outstanding-bytes counter underflowed and was clamped".into(),
            ))
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("total_len", &self.block.len())
            .field("segments", &self.segments.len())
            .field("released", &self.released.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        if !self.released.load(Ordering::Acquire) {
            #[cfg(feature = "tracing")]
            tracing::debug!(bytes = self.block.len(), "live entry dropped; reclaiming");
            // Never panic in drop; an underflow is already logged by the
            // budget when it clamps.
            let _ = self.release_inner();
        }
    }
}
