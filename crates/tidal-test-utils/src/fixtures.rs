//! Reusable allocation workloads.
//!
//! - [`Workload::uniform`]: identical requests, for exact capacity math.
//! - [`Workload::seeded`]: mixed sizes and alignments from a fixed seed,
//!   so a failing run replays bit-for-bit.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Alignments drawn by [`Workload::seeded`].
pub const SEEDED_ALIGNS: [usize; 6] = [1, 8, 16, 64, 128, 256];

/// One `allocate(size, align)` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocRequest {
    pub size: usize,
    pub align: usize,
}

/// An ordered list of requests, replayed by every harness worker.
#[derive(Clone, Debug, Default)]
pub struct Workload {
    requests: Vec<AllocRequest>,
}

impl Workload {
    /// `count` requests of `size` bytes at `align`.
    pub fn uniform(count: usize, size: usize, align: usize) -> Self {
        Self {
            requests: vec![AllocRequest { size, align }; count],
        }
    }

    /// `count` requests with sizes in `1..=max_size` and alignments from
    /// [`SEEDED_ALIGNS`], deterministic in `seed`.
    pub fn seeded(seed: u64, count: usize, max_size: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let requests = (0..count)
            .map(|_| {
                let size = 1 + (rng.next_u64() as usize) % max_size.max(1);
                let align = SEEDED_ALIGNS[(rng.next_u32() as usize) % SEEDED_ALIGNS.len()];
                AllocRequest { size, align }
            })
            .collect();
        Self { requests }
    }

    pub fn requests(&self) -> &[AllocRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Sum of requested sizes, before any padding.
    pub fn total_bytes(&self) -> usize {
        self.requests.iter().map(|r| r.size).sum()
    }
}
