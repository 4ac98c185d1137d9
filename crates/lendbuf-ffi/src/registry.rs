//! Handle registry for entries lent across the C boundary.
//!
//! Handles are issued ids, never raw addresses: an id either refers to a
//! live entry, or is provably stale (issued once, released since), or was
//! never issued at all. Address-keyed maps cannot tell the last two apart
//! once the allocator reuses a block.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use lendbuf_core::error::{Error, Result};
use lendbuf_pool::Entry;

pub struct Registry {
    entries: Mutex<HashMap<u64, Entry>>,
    next_handle: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            // Handle 0 is never issued, so embedders can use it as a nil
            // sentinel.
            next_handle: AtomicU64::new(1),
        }
    }

    /// Move `entry` into the registry and issue its handle.
    pub fn insert(&self, entry: Entry) -> u64 {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(handle, entry);
        handle
    }

    /// Run `f` against the live entry for `handle`.
    pub fn with_entry_mut<T>(
        &self,
        handle: u64,
        f: impl FnOnce(&mut Entry) -> Result<T>,
    ) -> Result<T> {
        let mut entries = self.lock();
        match entries.get_mut(&handle) {
            Some(entry) => f(entry),
            None => Err(self.miss(handle)),
        }
    }

    /// Remove and return the live entry for `handle`. `Ok(None)` means the
    /// handle was valid once and has already been released: the idempotent
    /// double-release case, which is not an error.
    pub fn remove(&self, handle: u64) -> Result<Option<Entry>> {
        let mut entries = self.lock();
        match entries.remove(&handle) {
            Some(entry) => Ok(Some(entry)),
            None => match self.miss(handle) {
                Error::AlreadyReleased => Ok(None),
                e => Err(e),
            },
        }
    }

    /// Classify an absent handle: bogus, or merely released already.
    fn miss(&self, handle: u64) -> Error {
        if handle == 0 || handle >= self.next_handle.load(Ordering::Relaxed) {
            Error::InvalidHandle(handle)
        } else {
            Error::AlreadyReleased
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        // Poisoning means a caller panicked while holding the map; fatal.
        self.entries.lock().unwrap()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
