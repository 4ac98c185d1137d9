//! Allocation-failure rollback tests (feature: `failpoints`)
//!
//! Kept to a single test: the failpoint switch is process-global, so the
//! set/clear sequence below must not interleave with other acquisitions.
#![cfg(feature = "failpoints")]

use lendbuf_core::config::PoolConfig;
use lendbuf_core::error::Error;
use lendbuf_pool::BufferPool;

#[test]
fn test_alloc_failure_rolls_back_reservation() {
    let config = PoolConfig::new(4096, 4096).expect("valid config");
    let pool = BufferPool::with_config(&config).expect("pool construction failed");

    // Force the host allocation to fail underneath an admitted reservation
    std::env::set_var("LENDBUF_FAILPOINTS", "block_alloc");
    let err = pool.acquire(&[1024]).expect_err("Allocation should fail");
    assert!(matches!(err, Error::AllocFailed { bytes: 1024 }));

    // The provisional reservation must be rolled back in full
    assert_eq!(pool.outstanding_bytes(), 0);
    let stats = pool.stats();
    assert_eq!(stats.alloc_failures, 1);
    assert_eq!(stats.acquisitions, 0);

    // With the failpoint cleared the same request goes through
    std::env::remove_var("LENDBUF_FAILPOINTS");
    let entry = pool
        .acquire(&[1024])
        .expect("Acquire after clearing the failpoint failed");
    assert_eq!(pool.outstanding_bytes(), 1024);
    drop(entry);
    assert_eq!(pool.outstanding_bytes(), 0);
}
