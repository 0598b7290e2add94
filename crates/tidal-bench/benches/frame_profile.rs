//! Criterion benchmarks for whole frames on the reference and stress profiles.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tidal_arena::RewindArena;
use tidal_bench::{frame_requests, reference_profile, run_frame, stress_profile};

/// Benchmark: one 512-request frame plus rewind on a warm reference arena.
fn bench_reference_frame(c: &mut Criterion) {
    let mut arena = RewindArena::new(reference_profile()).unwrap();
    let requests = frame_requests(512, 42);
    c.bench_function("reference_frame_512", |b| {
        b.iter(|| {
            black_box(run_frame(&arena, &requests).unwrap());
            arena.rewind().unwrap();
        });
    });
}

/// Benchmark: the same frame on a fresh stress arena, so growth is paid
/// every iteration.
fn bench_stress_cold_frame(c: &mut Criterion) {
    let requests = frame_requests(512, 42);
    c.bench_function("stress_cold_frame_512", |b| {
        b.iter(|| {
            let arena = RewindArena::new(stress_profile()).unwrap();
            black_box(run_frame(&arena, &requests).unwrap());
        });
    });
}

criterion_group!(benches, bench_reference_frame, bench_stress_cold_frame);
criterion_main!(benches);
