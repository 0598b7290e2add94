//! Point-in-time view of an arena's blocks and cursors.

use smallvec::SmallVec;
use tidal_core::Generation;

/// Occupancy of one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockStats {
    /// Slot index in the block table.
    pub index: usize,
    /// Block size in bytes.
    pub capacity: usize,
    /// Bytes consumed, including padding and abandoned reservations.
    pub used: usize,
    /// Allocations not individually freed.
    pub live: usize,
}

/// Snapshot returned by [`RewindArena::stats`](crate::RewindArena::stats).
///
/// Taken without the spinlock, so under concurrent allocation the figures
/// may be mutually inconsistent by a few in-flight requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaStats {
    /// Every block currently holding storage, in table order.
    pub blocks: SmallVec<[BlockStats; 8]>,
    /// Fast-path hint cursor.
    pub best: usize,
    /// Highest index in the current cycle.
    pub last: usize,
    /// Highest index allocated from this cycle.
    pub used: usize,
    /// Registry generation of the arena.
    pub generation: Generation,
}

impl ArenaStats {
    /// Sum of block capacities.
    pub fn capacity_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.capacity).sum()
    }

    /// Sum of bytes consumed across blocks.
    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.used).sum()
    }
}
