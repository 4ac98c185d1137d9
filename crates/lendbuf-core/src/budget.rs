//! Abstract byte-budget interfaces.
//!
//! The concrete implementation lives in `lendbuf-pool`. We keep only traits
//! here so any crate can depend on the API without pulling in the allocator.

use crate::error::Result;

/// A grant returned by a budget when bytes are admitted.
///
/// The concrete type lives in `lendbuf-pool`. It must be RAII (credits the
/// budget on Drop), `Send`, and panic-safe.
pub trait ByteGrant: Send {
    /// Number of bytes currently held against the budget by this grant.
    fn bytes(&self) -> u64;
}

/// A handle representing the outstanding-bytes enforcer.
///
/// Implemented by `lendbuf-pool`. The pool calls `reserve` before touching
/// the host allocator. A rejection must leave the counter unchanged; the
/// admission check and the increment are a single atomic step.
pub trait ByteBudget: Send + Sync + 'static {
    type Grant: ByteGrant;

    /// Attempt to reserve `bytes` against both ceilings. Returns a grant on
    /// admission, a rejection error otherwise.
    fn reserve(&self, bytes: u64) -> Result<Self::Grant>;

    /// Global outstanding-bytes ceiling.
    fn capacity_bytes(&self) -> u64;

    /// Per-acquisition ceiling.
    fn max_request_bytes(&self) -> u64;

    /// Bytes currently outstanding (advisory; not a correctness API).
    fn outstanding_bytes(&self) -> u64;
}

// NOTE: Do *not* add default impls here that would silently admit requests.
// The pool crate is the only place where grants should be constructed.
