//! lendbuf-ffi: the C ABI surface of the pool.
//!
//! Mirrors `include/lendbuf.h`. Every function returns a status code with
//! `LENDBUF_OK == 0`. The embedder configures the process-wide pool exactly
//! once, acquires entries as a handle plus a base pointer into one
//! contiguous block, and releases by handle. Release may be triggered twice
//! for the same entry (typically once explicitly and once from a managed
//! runtime's finalizer); the duplicate is a no-op.
//!
//! Borrowed pointers (the block base and per-view pointers) stay valid until
//! the entry's first release and must not be used afterwards.

mod registry;

use once_cell::sync::OnceCell;

use lendbuf_core::error::{Error, Result};
use lendbuf_core::prelude::PoolConfig;
use lendbuf_pool::{BufferPool, ByteBudgetImpl};

use crate::registry::Registry;

struct PoolState {
    pool: BufferPool<ByteBudgetImpl>,
    registry: Registry,
}

static STATE: OnceCell<PoolState> = OnceCell::new();

fn state() -> Result<&'static PoolState> {
    STATE.get().ok_or(Error::NotConfigured)
}

/// Status codes returned by every `lendbuf_*` function. Kept in sync with
/// the `LENDBUF_*` constants in `include/lendbuf.h`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendbufStatus {
    Ok = 0,
    InvalidConfig = 1,
    NotConfigured = 2,
    AlreadyConfigured = 3,
    RequestTooLarge = 4,
    BudgetExhausted = 5,
    SizeOverflow = 6,
    AllocFailed = 7,
    ReleaseAccounting = 8,
    AlreadyReleased = 9,
    InvalidHandle = 10,
    InvalidIndex = 11,
    InvalidArgument = 12,
}

impl From<&Error> for LendbufStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => LendbufStatus::InvalidConfig,
            Error::NotConfigured => LendbufStatus::NotConfigured,
            Error::AlreadyConfigured => LendbufStatus::AlreadyConfigured,
            Error::RequestTooLarge { .. } => LendbufStatus::RequestTooLarge,
            Error::BudgetExhausted { .. } => LendbufStatus::BudgetExhausted,
            Error::SizeOverflow => LendbufStatus::SizeOverflow,
            Error::AllocFailed { .. } => LendbufStatus::AllocFailed,
            Error::ReleaseAccounting(_) => LendbufStatus::ReleaseAccounting,
            Error::AlreadyReleased => LendbufStatus::AlreadyReleased,
            Error::SegmentOutOfRange { .. } => LendbufStatus::InvalidIndex,
            Error::InvalidHandle(_) => LendbufStatus::InvalidHandle,
        }
    }
}

/// What `lendbuf_acquire` hands to the embedder: the issued handle, the base
/// pointer of the contiguous block (null when the total size is zero), and
/// the block length. The embedder may slice the block itself or ask for
/// per-view pointers through `lendbuf_view`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LendbufEntry {
    pub handle: u64,
    pub data: *mut u8,
    pub total_len: u64,
}

fn handle_result(res: Result<()>) -> LendbufStatus {
    match res {
        Ok(()) => LendbufStatus::Ok,
        Err(e) => LendbufStatus::from(&e),
    }
}

// ----- impl fns: all pointer handling stays in the extern wrappers -----

fn configure_impl(max_total_bytes: u64, max_request_bytes: u64) -> Result<()> {
    let config = PoolConfig::new(max_total_bytes, max_request_bytes)?;
    let pool_state = PoolState {
        pool: BufferPool::with_config(&config)?,
        registry: Registry::new(),
    };
    STATE.set(pool_state).map_err(|_| Error::AlreadyConfigured)?;
    #[cfg(feature = "tracing")]
    tracing::info!(
        max_total_bytes = config.max_total_bytes,
        max_request_bytes = config.max_request_bytes,
        "pool configured"
    );
    Ok(())
}

fn acquire_impl(sizes: &[u64], out_entry: &mut LendbufEntry) -> Result<()> {
    let state = state()?;
    let mut entry = state.pool.acquire(sizes)?;
    let total_len = entry.total_len() as u64;
    let data = match entry.as_bytes_mut() {
        Ok(bytes) if !bytes.is_empty() => bytes.as_mut_ptr(),
        _ => std::ptr::null_mut(),
    };
    let handle = state.registry.insert(entry);
    #[cfg(feature = "tracing")]
    tracing::trace!(handle, total_len, views = sizes.len(), "entry lent");
    *out_entry = LendbufEntry {
        handle,
        data,
        total_len,
    };
    Ok(())
}

fn view_impl(handle: u64, index: usize, out_data: &mut *mut u8, out_len: &mut u64) -> Result<()> {
    let state = state()?;
    state.registry.with_entry_mut(handle, |entry| {
        let view = entry.view_mut(index)?;
        *out_len = view.len() as u64;
        *out_data = if view.is_empty() {
            std::ptr::null_mut()
        } else {
            view.as_mut_ptr()
        };
        Ok(())
    })
}

fn release_impl(handle: u64) -> Result<()> {
    let state = state()?;
    match state.registry.remove(handle)? {
        Some(mut entry) => {
            let res = entry.release();
            #[cfg(feature = "tracing")]
            tracing::trace!(handle, "entry released");
            res
        }
        // The finalizer and an explicit call may both fire; the loser of
        // that race lands here.
        None => Ok(()),
    }
}

fn outstanding_bytes_impl(out_bytes: &mut u64) -> Result<()> {
    *out_bytes = state()?.pool.outstanding_bytes();
    Ok(())
}

// ----- extern surface -----

/// Install the process-wide pool with the two ceilings. Must be called
/// before any acquisition; the second and later calls fail with
/// `LENDBUF_ALREADY_CONFIGURED` and leave the first configuration in place.
#[no_mangle]
pub extern "C" fn lendbuf_configure(max_total_bytes: u64, max_request_bytes: u64) -> LendbufStatus {
    handle_result(configure_impl(max_total_bytes, max_request_bytes))
}

/// Acquire one zeroed block carved into `sizes_len` views and write the
/// lease into `out_entry`.
///
/// # Safety
///
/// `sizes` must point to `sizes_len` readable `uint64_t`s (it may be null
/// only when `sizes_len` is zero) and `out_entry` must be a valid, writable
/// `lendbuf_entry`.
#[no_mangle]
pub unsafe extern "C" fn lendbuf_acquire(
    sizes: *const u64,
    sizes_len: usize,
    out_entry: *mut LendbufEntry,
) -> LendbufStatus {
    if out_entry.is_null() || (sizes.is_null() && sizes_len != 0) {
        return LendbufStatus::InvalidArgument;
    }
    let sizes = if sizes_len == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(sizes, sizes_len)
    };
    handle_result(acquire_impl(sizes, &mut *out_entry))
}

/// Fetch the pointer and length of view `index` of a live entry, saving the
/// embedder its own offset arithmetic.
///
/// # Safety
///
/// `out_data` and `out_len` must be valid, writable pointers.
#[no_mangle]
pub unsafe extern "C" fn lendbuf_view(
    handle: u64,
    index: usize,
    out_data: *mut *mut u8,
    out_len: *mut u64,
) -> LendbufStatus {
    if out_data.is_null() || out_len.is_null() {
        return LendbufStatus::InvalidArgument;
    }
    handle_result(view_impl(handle, index, &mut *out_data, &mut *out_len))
}

/// Return an entry's bytes to the pool. Releasing a handle that was already
/// released is a no-op that returns `LENDBUF_OK`; a handle that was never
/// issued is `LENDBUF_INVALID_HANDLE`.
#[no_mangle]
pub extern "C" fn lendbuf_release(handle: u64) -> LendbufStatus {
    handle_result(release_impl(handle))
}

/// Read the bytes currently out on loan (diagnostic).
///
/// # Safety
///
/// `out_bytes` must be a valid, writable pointer.
#[no_mangle]
pub unsafe extern "C" fn lendbuf_outstanding_bytes(out_bytes: *mut u64) -> LendbufStatus {
    if out_bytes.is_null() {
        return LendbufStatus::InvalidArgument;
    }
    handle_result(outstanding_bytes_impl(&mut *out_bytes))
}
