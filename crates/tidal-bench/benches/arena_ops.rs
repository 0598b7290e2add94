//! Criterion micro-benchmarks for allocation, free and rewind.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tidal_arena::{ArenaConfig, RewindArena};
use tidal_test_utils::{hammer, Workload};

/// Benchmark: single 64-byte allocation on the lock-free fast path.
fn bench_fast_path_alloc(c: &mut Criterion) {
    let mut arena = RewindArena::new(ArenaConfig::new(1 << 20)).unwrap();
    let mut count = 0usize;
    c.bench_function("fast_path_alloc_64", |b| {
        b.iter(|| {
            if count == (1 << 20) / 64 {
                arena.rewind().unwrap();
                count = 0;
            }
            black_box(arena.allocate(64, 8).unwrap());
            count += 1;
        });
    });
}

/// Benchmark: 1000 allocations followed by a rewind, growth included on
/// the first iteration only.
fn bench_alloc_rewind_cycle(c: &mut Criterion) {
    let mut arena = RewindArena::new(ArenaConfig::new(4096)).unwrap();
    c.bench_function("alloc_rewind_cycle_1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(arena.allocate(100, 16).unwrap());
            }
            arena.rewind().unwrap();
        });
    });
}

/// Benchmark: allocate and immediately free with block free enabled.
fn bench_alloc_free(c: &mut Criterion) {
    let arena = RewindArena::new(ArenaConfig::new(4096).with_block_free(true)).unwrap();
    c.bench_function("alloc_free_64", |b| {
        b.iter(|| {
            let p = arena.allocate(64, 8).unwrap();
            arena.free(black_box(p));
        });
    });
}

/// Benchmark: 4 threads racing on one arena, 256 allocations each.
fn bench_contended_alloc(c: &mut Criterion) {
    let mut arena = RewindArena::new(ArenaConfig::new(1 << 20)).unwrap();
    let workload = Workload::uniform(256, 48, 8);
    c.bench_function("contended_alloc_4x256", |b| {
        b.iter(|| {
            black_box(hammer(&arena, 4, &workload).unwrap());
            arena.rewind().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_fast_path_alloc,
    bench_alloc_rewind_cycle,
    bench_alloc_free,
    bench_contended_alloc
);
criterion_main!(benches);
