//! Per-frame scratch allocation loop.
//!
//! Demonstrates: create arena → allocate a frame's buffers → inspect stats
//! → rewind → repeat, with the trim rule shrinking the table once frames
//! get lighter.

use tidal_arena::RewindArena;
use tidal_bench::{frame_requests, run_frame, stress_profile};

fn main() {
    println!("=== Tidal Frame Loop Example ===\n");

    let mut arena = RewindArena::new(stress_profile()).unwrap();

    for frame in 0..6u64 {
        // Heavy frames first, then light ones.
        let count = if frame < 3 { 400 } else { 20 };
        let requests = frame_requests(count, frame);
        let bytes = run_frame(&arena, &requests).unwrap();

        let stats = arena.stats();
        println!(
            "frame {frame}: {count:>3} requests, {bytes:>7} B requested, \
             {:>7} B used, {} blocks, {:>7} B capacity",
            stats.used_bytes(),
            stats.blocks.len(),
            stats.capacity_bytes(),
        );

        arena.rewind().unwrap();
    }

    println!(
        "\nafter rewinds: {} blocks, generation {}",
        arena.blocks_allocated(),
        arena.generation()
    );
    arena.dispose().unwrap();
    println!("disposed: {}", arena.is_disposed());
}
