//! Benchmark profiles and utilities for the Tidal rewind allocator.
//!
//! Provides pre-built [`ArenaConfig`] profiles and a frame workload for
//! benchmarks and examples:
//!
//! - [`reference_profile`]: 64 KiB first block, block free disabled
//! - [`stress_profile`]: 4 KiB first block, so a frame forces growth
//! - [`frame_requests`]: deterministic per-frame request mix via seed
//! - [`run_frame`]: replay one frame's requests against any allocator

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tidal_arena::ArenaConfig;
use tidal_core::{ArenaError, ScratchAllocator};

/// Reference profile: one 64 KiB block comfortably holds a frame.
pub fn reference_profile() -> ArenaConfig {
    ArenaConfig::new(64 * 1024)
}

/// Stress profile: a 4 KiB first block, so every cold frame grows the
/// table several times.
pub fn stress_profile() -> ArenaConfig {
    ArenaConfig::new(4 * 1024)
}

/// Generate `count` deterministic `(size, align)` requests.
///
/// Mixes small command buffers with occasional large staging buffers,
/// roughly the shape of a render or simulation frame.
pub fn frame_requests(count: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let roll = (state >> 33) as usize;
            let size = if roll % 16 == 0 {
                1024 + roll % 8192
            } else {
                16 + roll % 240
            };
            let align = [8, 16, 64, 256][roll % 4];
            (size, align)
        })
        .collect()
}

/// Allocate every request once. Returns the number of bytes requested.
pub fn run_frame<A>(alloc: &A, requests: &[(usize, usize)]) -> Result<usize, ArenaError>
where
    A: ScratchAllocator + ?Sized,
{
    let mut total = 0;
    for &(size, align) in requests {
        alloc.allocate(size, align)?;
        total += size;
    }
    Ok(total)
}
