#![forbid(unsafe_code)]
//! lendbuf-pool: hard byte budgeting and the bounded lending pool.
//!
//! This crate provides concrete implementations for the *interfaces* defined
//! in `lendbuf-core::budget`. Every block acquisition flows through the pool
//! so the two configured ceilings hold with RAII grants, however the entries
//! are eventually released.
//!
//! No FFI lives here; the C ABI surface is `lendbuf-ffi`.

pub mod block;
pub mod budget;
pub mod entry;
pub mod failpoints;
pub mod pool;
pub mod segments;
pub mod stats;

pub use budget::{ByteBudgetImpl, ByteGrantImpl};
pub use entry::Entry;
pub use pool::BufferPool;
pub use segments::Segment;
pub use stats::{PoolStats, StatsSnapshot};
