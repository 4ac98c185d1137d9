//! Byte budget enforcement tests

use lendbuf_core::budget::{ByteBudget, ByteGrant};
use lendbuf_core::config::PoolConfig;
use lendbuf_core::error::Error;
use lendbuf_pool::ByteBudgetImpl;
use std::sync::Arc;
use std::thread;

fn budget_with(max_total: u64, max_request: u64) -> ByteBudgetImpl {
    ByteBudgetImpl::new(&PoolConfig {
        max_total_bytes: max_total,
        max_request_bytes: max_request,
    })
}

#[test]
fn test_budget_reserve_release() {
    let budget = budget_with(1024 * 1024, 1024 * 1024); // 1MB

    // Initially nothing outstanding
    assert_eq!(budget.outstanding_bytes(), 0);

    // Reserve 100KB
    let grant = budget.reserve(100 * 1024).expect("Reserve failed");
    assert_eq!(budget.outstanding_bytes(), 100 * 1024);
    assert_eq!(grant.bytes(), 100 * 1024);

    // Release by dropping the grant
    drop(grant);
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_exhaustion() {
    let budget = budget_with(500 * 1024, 500 * 1024); // 500KB

    // Reserve 400KB
    let grant1 = budget.reserve(400 * 1024).expect("First reserve failed");
    assert_eq!(budget.outstanding_bytes(), 400 * 1024);

    // Another 200KB must fail (total would be 600KB > 500KB)
    let err = budget
        .reserve(200 * 1024)
        .expect_err("Should fail to reserve beyond capacity");
    assert!(err.is_rejection());
    match err {
        Error::BudgetExhausted {
            requested,
            outstanding,
            capacity,
        } => {
            assert_eq!(requested, 200 * 1024);
            assert_eq!(outstanding, 400 * 1024);
            assert_eq!(capacity, 500 * 1024);
        }
        other => panic!("Expected BudgetExhausted, got {other:?}"),
    }

    // The rejection must not move the counter
    assert_eq!(budget.outstanding_bytes(), 400 * 1024);

    // Release the first grant
    drop(grant1);
    assert_eq!(budget.outstanding_bytes(), 0);

    // Now the 200KB fits
    let grant2 = budget
        .reserve(200 * 1024)
        .expect("Reserve after release failed");
    assert_eq!(budget.outstanding_bytes(), 200 * 1024);

    drop(grant2);
}

#[test]
fn test_budget_request_ceiling() {
    let budget = budget_with(100, 50);

    // A request above the per-request ceiling fails even though the total
    // budget has room
    let err = budget.reserve(60).expect_err("Should reject oversized request");
    assert!(err.is_rejection());
    match err {
        Error::RequestTooLarge {
            requested,
            max_request,
        } => {
            assert_eq!(requested, 60);
            assert_eq!(max_request, 50);
        }
        other => panic!("Expected RequestTooLarge, got {other:?}"),
    }
    assert_eq!(budget.outstanding_bytes(), 0);

    // A request at the ceiling is admitted
    let grant = budget.reserve(50).expect("Reserve at ceiling failed");
    assert_eq!(budget.outstanding_bytes(), 50);
    drop(grant);
}

#[test]
fn test_budget_grant_drop() {
    let budget = budget_with(1024 * 1024, 1024 * 1024);

    {
        let _grant1 = budget.reserve(100 * 1024).expect("Reserve failed");
        assert_eq!(budget.outstanding_bytes(), 100 * 1024);

        {
            let _grant2 = budget.reserve(200 * 1024).expect("Reserve failed");
            assert_eq!(budget.outstanding_bytes(), 300 * 1024);

            // grant2 drops here
        }

        // grant2's bytes must be credited back
        assert_eq!(budget.outstanding_bytes(), 100 * 1024);

        // grant1 drops here
    }

    // Everything credited back
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_concurrent_access() {
    let budget = Arc::new(budget_with(1024 * 1024, 1024 * 1024)); // 1MB shared
    let mut handles = vec![];

    // Spawn 10 threads, each reserving and releasing 50KB
    for _ in 0..10 {
        let budget_clone = Arc::clone(&budget);
        let handle = thread::spawn(move || {
            if let Ok(grant) = budget_clone.reserve(50 * 1024) {
                // Hold it briefly
                thread::sleep(std::time::Duration::from_millis(10));
                assert_eq!(grant.bytes(), 50 * 1024);
                // Grant drops here
            }
        });
        handles.push(handle);
    }

    // Wait for all threads
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Everything credited back
    assert_eq!(budget.outstanding_bytes(), 0);

    // Verify the budget is whole by reserving the full capacity
    let full_grant = budget
        .reserve(1024 * 1024)
        .expect("Should be able to reserve the full budget");
    assert_eq!(budget.outstanding_bytes(), 1024 * 1024);
    drop(full_grant);
}

#[test]
fn test_budget_multiple_grants() {
    let budget = budget_with(1024 * 1024, 1024 * 1024);

    let grant1 = budget.reserve(100 * 1024).expect("Reserve 1 failed");
    let grant2 = budget.reserve(200 * 1024).expect("Reserve 2 failed");
    let grant3 = budget.reserve(300 * 1024).expect("Reserve 3 failed");

    assert_eq!(budget.outstanding_bytes(), 600 * 1024);

    // Release in a different order than reserved
    drop(grant2);
    assert_eq!(budget.outstanding_bytes(), 400 * 1024);

    drop(grant1);
    assert_eq!(budget.outstanding_bytes(), 300 * 1024);

    drop(grant3);
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_zero_size_reservation() {
    let budget = budget_with(1024 * 1024, 1024 * 1024);

    // Reserving 0 bytes succeeds without touching the counter
    let grant = budget.reserve(0).expect("Zero-size reservation should succeed");
    assert_eq!(grant.bytes(), 0);
    assert_eq!(budget.outstanding_bytes(), 0);

    drop(grant);
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_exact_capacity() {
    let budget = budget_with(1024, 1024);

    // Reserve exactly the capacity
    let grant = budget.reserve(1024).expect("Should reserve exact capacity");
    assert_eq!(budget.outstanding_bytes(), 1024);

    // No more room, not even one byte
    let err = budget.reserve(1).expect_err("Should not admit even 1 byte");
    assert!(matches!(err, Error::BudgetExhausted { .. }));

    drop(grant);
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_reuse_after_partial_release() {
    let budget = budget_with(1000, 1000);

    let g1 = budget.reserve(300).expect("Reserve 1");
    let g2 = budget.reserve(300).expect("Reserve 2");
    let g3 = budget.reserve(300).expect("Reserve 3");

    assert_eq!(budget.outstanding_bytes(), 900);

    // Release the middle grant
    drop(g2);
    assert_eq!(budget.outstanding_bytes(), 600);

    // The freed room admits a new reservation
    let g4 = budget.reserve(300).expect("Reserve 4 in freed room");
    assert_eq!(budget.outstanding_bytes(), 900);

    drop(g1);
    drop(g3);
    drop(g4);
    assert_eq!(budget.outstanding_bytes(), 0);
}

#[test]
fn test_budget_high_contention() {
    let budget = Arc::new(budget_with(100 * 1024, 100 * 1024)); // 100KB total
    let num_threads = 20;
    let mut handles = vec![];

    for _ in 0..num_threads {
        let budget_clone = Arc::clone(&budget);
        let handle = thread::spawn(move || {
            for _ in 0..10 {
                // Try to reserve 10KB repeatedly
                match budget_clone.reserve(10 * 1024) {
                    Ok(grant) => {
                        // Simulate some work
                        thread::sleep(std::time::Duration::from_micros(100));
                        drop(grant);
                    }
                    Err(_) => {
                        // Rejected, back off and retry
                        thread::sleep(std::time::Duration::from_micros(50));
                    }
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Everything credited back
    assert_eq!(budget.outstanding_bytes(), 0);
}
