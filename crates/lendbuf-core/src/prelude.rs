//! Convenient re-exports for downstream crates.

pub use crate::budget::{ByteBudget, ByteGrant};
pub use crate::config::PoolConfig;
pub use crate::error::{Error, Result};
