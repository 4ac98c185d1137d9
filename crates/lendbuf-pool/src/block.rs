//! Contiguous zeroed blocks with fallible host allocation.

use lendbuf_core::error::{Error, Result};

/// One contiguous zero-initialized byte region. Exactly one entry owns a
/// block at a time; the region is returned to the host by dropping it.
pub struct Block {
    bytes: Vec<u8>,
}

impl Block {
    /// The empty block, used for zero-total acquisitions and for the
    /// released state. Does not touch the host allocator.
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Allocate a zero-filled block of `len` bytes. Host refusal is reported
    /// as `AllocFailed`, never an abort; the caller rolls the budget back by
    /// dropping its grant.
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty());
        }
        crate::fail_point!("block_alloc", {
            return Err(Error::AllocFailed { bytes: len as u64 });
        });
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| Error::AllocFailed { bytes: len as u64 })?;
        bytes.resize(len, 0u8);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
