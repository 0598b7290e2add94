//! Multi-threaded allocation driven by the tidal-test-utils harness.

use std::sync::atomic::{AtomicUsize, Ordering};

use tidal_arena::{ArenaConfig, ArenaError, ExhaustionCause, Registry, RewindArena};
use tidal_test_utils::{assert_aligned, assert_disjoint, free_all, hammer, Workload};

fn private_registry() -> &'static Registry {
    Box::leak(Box::new(Registry::new()))
}

fn arena(config: ArenaConfig) -> RewindArena {
    RewindArena::with_registry(config, private_registry()).unwrap()
}

#[test]
fn single_block_contention_is_disjoint() {
    let a = arena(ArenaConfig::new(1 << 20));
    let records = hammer(&a, 8, &Workload::uniform(500, 48, 8)).unwrap();
    assert_eq!(records.len(), 4000);
    assert_eq!(a.blocks_allocated(), 1);
    assert_disjoint(&records);
    assert_aligned(&records, 64);
}

#[test]
fn growth_under_contention_is_disjoint() {
    let a = arena(ArenaConfig::new(1024));
    let records = hammer(&a, 8, &Workload::seeded(0xC0FFEE, 400, 700)).unwrap();
    assert_eq!(records.len(), 3200);
    assert!(a.blocks_allocated() > 1);
    assert_disjoint(&records);
    assert_aligned(&records, 64);
    for r in &records {
        assert!(a.locate(r.ptr()).is_some());
    }
}

#[test]
fn table_full_surfaces_as_resource_exhausted() {
    let a = arena(ArenaConfig::new(1024).with_max_blocks(2));
    let err = hammer(&a, 4, &Workload::uniform(100, 64, 1)).unwrap_err();
    assert!(matches!(
        err,
        ArenaError::ResourceExhausted {
            cause: ExhaustionCause::TableFull { max_blocks: 2 },
            ..
        }
    ));
}

#[test]
fn rewind_between_concurrent_cycles() {
    let mut a = arena(ArenaConfig::new(4096));
    let workload = Workload::seeded(7, 200, 300);
    for cycle in 0..4 {
        let records = hammer(&a, 4, &workload).unwrap();
        assert_disjoint(&records);
        a.rewind().unwrap();
        assert_eq!(a.used_bytes(), 0, "cycle {cycle}");
    }
}

#[test]
fn concurrent_frees_never_corrupt_live_ranges() {
    let a = arena(ArenaConfig::new(1 << 16).with_block_free(true));
    let workload = Workload::uniform(200, 64, 1);
    let first = hammer(&a, 4, &workload).unwrap();

    // Free the first batch while a second batch allocates.
    let second = std::thread::scope(|s| {
        s.spawn(|| free_all(&a, &first));
        hammer(&a, 4, &workload).unwrap()
    });
    assert_disjoint(&second);
    assert_aligned(&second, 64);
    // Only first-batch pointers were freed; the second batch stays live.
    let live: usize = a.stats().blocks.iter().map(|b| b.live).sum();
    assert!(live >= second.len(), "live {live} < {}", second.len());
}

#[test]
fn work_tokens_block_rewind_until_tasks_finish() {
    let mut a = arena(ArenaConfig::new(1 << 16));
    let done = AtomicUsize::new(0);
    let tracker = a.work_tracker().clone();
    let tokens: Vec<_> = (0..4).map(|_| tracker.enter()).collect();

    std::thread::scope(|s| {
        for token in tokens {
            let a = &a;
            let done = &done;
            s.spawn(move || {
                let _token = token;
                for _ in 0..50 {
                    a.allocate(64, 1).unwrap();
                }
                done.fetch_add(1, Ordering::Release);
            });
        }
    });

    assert_eq!(done.load(Ordering::Acquire), 4);
    assert!(tracker.is_idle());
    a.rewind().unwrap();
}
