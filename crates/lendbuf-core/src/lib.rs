#![forbid(unsafe_code)]
//! lendbuf-core: shared contracts for the lendbuf buffer pool.
//!
//! Configuration, the error taxonomy, and the abstract budget interface live
//! here so outer crates (the C ABI surface, embedder glue) can depend on the
//! API without pulling in the allocator. No allocations, no I/O.

pub mod budget;
pub mod config;
pub mod error;
pub mod prelude;

pub use config::PoolConfig;
pub use error::{Error, Result};
