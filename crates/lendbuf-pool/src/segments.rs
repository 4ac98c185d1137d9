//! Sub-buffer layout: turn an ordered size list into contiguous segments.

use lendbuf_core::error::{Error, Result};

/// Half-open byte range `[offset, offset + len)` inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub offset: usize,
    pub len: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Compute the segment layout for `sizes`, in request order.
///
/// Offsets are the running prefix sums, so segments tile the eventual block
/// exactly: no gaps, no overlap, and the returned total equals the sum of all
/// sizes. A sum that cannot be addressed on this host is rejected as
/// `SizeOverflow` rather than wrapped. Empty input yields no segments and a
/// zero total.
pub fn carve(sizes: &[u64]) -> Result<(Vec<Segment>, u64)> {
    let mut segments = Vec::with_capacity(sizes.len());
    let mut total: u64 = 0;
    for &size in sizes {
        let offset = usize::try_from(total).map_err(|_| Error::SizeOverflow)?;
        let len = usize::try_from(size).map_err(|_| Error::SizeOverflow)?;
        total = total.checked_add(size).ok_or(Error::SizeOverflow)?;
        segments.push(Segment { offset, len });
    }
    // The total itself must be addressable; individual sizes fitting is not
    // enough on 32-bit hosts.
    usize::try_from(total).map_err(|_| Error::SizeOverflow)?;
    Ok((segments, total))
}
