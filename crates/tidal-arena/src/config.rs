//! Arena configuration parameters.

use tidal_core::ArenaError;

use crate::block::CACHE_LINE_SIZE;

/// Configuration for a [`RewindArena`](crate::RewindArena).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of block 0 in bytes. Later blocks double relative to it.
    ///
    /// Must be at least [`CACHE_LINE_SIZE`].
    pub initial_block_bytes: usize,

    /// Whether `free` reclaims the active block once it drains.
    ///
    /// Default: `false` (every free is a no-op).
    pub enable_block_free: bool,

    /// Fixed capacity of the block table.
    ///
    /// Default: 32. Block `i` is at least `initial_block_bytes << i`, so
    /// this also bounds the total footprint.
    pub max_blocks: usize,
}

impl ArenaConfig {
    /// Default block table capacity.
    pub const DEFAULT_MAX_BLOCKS: usize = 32;

    /// Smallest accepted initial block.
    pub const MIN_INITIAL_BLOCK_BYTES: usize = CACHE_LINE_SIZE;

    /// Config with the given initial block size and defaults elsewhere.
    pub fn new(initial_block_bytes: usize) -> Self {
        Self {
            initial_block_bytes,
            enable_block_free: false,
            max_blocks: Self::DEFAULT_MAX_BLOCKS,
        }
    }

    /// Turn single-block reclamation on or off.
    pub fn with_block_free(mut self, enabled: bool) -> Self {
        self.enable_block_free = enabled;
        self
    }

    /// Override the block table capacity.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial_block_bytes < Self::MIN_INITIAL_BLOCK_BYTES {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_block_bytes must be >= {} (got {})",
                    Self::MIN_INITIAL_BLOCK_BYTES,
                    self.initial_block_bytes
                ),
            });
        }
        if self.max_blocks == 0 || self.max_blocks > usize::BITS as usize {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_blocks must be in 1..={} (got {})",
                    usize::BITS,
                    self.max_blocks
                ),
            });
        }
        Ok(())
    }
}
