//! The rewind allocator: lock-free fast path, locked scan-and-grow slow
//! path, and the per-cycle rewind/dispose lifecycle.
//!
//! # Allocation paths
//!
//! ```text
//! allocate(size, align)
//! ├── fast: try block[best]                      (no lock)
//! └── slow: SpinLock
//!     ├── scan block[0..=last]                   first fit wins, best = i
//!     └── grow at last+1                         reuse retained block or
//!                                                allocate a doubled one
//! ```
//!
//! Rewind and dispose take `&mut self`, so the borrow checker already keeps
//! them apart from `&self` allocation. The [`WorkTracker`] covers the case
//! the borrow checker cannot see: pointers handed to tasks that are still
//! running when the owner wants to rewind.

use std::fmt;
use std::ptr::NonNull;

use tidal_core::{
    ArenaError, ArenaHandle, ExhaustionCause, Generation, LifecycleOp, ScratchAllocator,
};
use tracing::{debug, trace};

use crate::block::{MemoryBlock, Request};
use crate::config::ArenaConfig;
use crate::registry::Registry;
use crate::spinlock::SpinLock;
use crate::stats::{ArenaStats, BlockStats};
use crate::table::BlockTable;
use crate::work::WorkTracker;
use crate::SAFETY_CHECKS;

/// Thread-safe bump allocator reclaimed in bulk once per cycle.
///
/// Allocate from any number of threads through `&self`; call
/// [`rewind`](Self::rewind) once per cycle from the owning context to
/// reclaim everything at once.
pub struct RewindArena {
    table: BlockTable,
    lock: SpinLock,
    config: ArenaConfig,
    registry: &'static Registry,
    handle: ArenaHandle,
    disposed: bool,
    work: WorkTracker,
}

// Compile-time assertion: RewindArena must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RewindArena>();
};

impl RewindArena {
    /// Create an arena registered in [`Registry::global`].
    ///
    /// Block 0 is allocated eagerly.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_registry(config, Registry::global())
    }

    /// Create an arena registered in `registry`.
    pub fn with_registry(
        config: ArenaConfig,
        registry: &'static Registry,
    ) -> Result<Self, ArenaError> {
        config.validate()?;
        let table = Self::initial_table(&config)?;
        let handle = registry.register()?;
        debug!(
            slot = handle.slot(),
            initial_block_bytes = config.initial_block_bytes,
            enable_block_free = config.enable_block_free,
            "arena created"
        );
        Ok(Self {
            table,
            lock: SpinLock::new(),
            config,
            registry,
            handle,
            disposed: false,
            work: WorkTracker::new(),
        })
    }

    fn initial_table(config: &ArenaConfig) -> Result<BlockTable, ArenaError> {
        let table = BlockTable::new(config.max_blocks);
        table.install(0, MemoryBlock::new(config.initial_block_bytes)?);
        Ok(table)
    }

    /// Allocate `size` bytes aligned to `max(align, CACHE_LINE_SIZE)`.
    ///
    /// The memory is uninitialised and stays valid until the next
    /// [`rewind`](Self::rewind). Fails with `ResourceExhausted` if the
    /// table cannot grow, `InvalidAlignment` for a non power-of-two
    /// `align`, and `Disposed` after [`dispose`](Self::dispose).
    pub fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        let request = Request::new(size, align)?;
        let fast = self
            .table
            .get(self.table.best())
            .map(|block| block.try_allocate(&request));
        let ptr = match fast {
            Some(Ok(ptr)) => ptr,
            _ => self.allocate_slow(&request)?,
        };
        if SAFETY_CHECKS {
            assert_eq!(
                ptr.as_ptr() as usize % request.align,
                0,
                "allocation misaligned for {}",
                request.align
            );
        }
        Ok(ptr)
    }

    #[cold]
    fn allocate_slow(&self, request: &Request) -> Result<NonNull<u8>, ArenaError> {
        let _guard = self.lock.lock();
        if self.disposed {
            return Err(ArenaError::Disposed);
        }

        let last = self.table.last();
        let scanned = (0..=last).find_map(|index| {
            let ptr = self.table.get(index)?.try_allocate(request).ok()?;
            Some((index, ptr))
        });
        let ptr = match scanned {
            Some((index, ptr)) => {
                self.table.promote(index);
                ptr
            }
            None => self.grow(request, last + 1)?,
        };

        if SAFETY_CHECKS {
            assert!(
                self.table.cursors_consistent(),
                "block table cursors out of order: best={} last={} used={}",
                self.table.best(),
                self.table.last(),
                self.table.used()
            );
        }
        Ok(ptr)
    }

    /// Extend the cycle past `last`, starting at slot `index`.
    ///
    /// Blocks kept by an earlier rewind are re-entered in order before any
    /// new block is allocated. Caller holds the spinlock.
    fn grow(&self, request: &Request, mut index: usize) -> Result<NonNull<u8>, ArenaError> {
        if SAFETY_CHECKS {
            assert!(self.lock.is_locked(), "block table grown without the spinlock");
        }
        loop {
            if index >= self.table.capacity() {
                return Err(ArenaError::ResourceExhausted {
                    requested: request.bytes,
                    cause: ExhaustionCause::TableFull {
                        max_blocks: self.table.capacity(),
                    },
                });
            }

            let block = match self.table.get(index) {
                Some(retained) => {
                    self.table.extend_to(index);
                    retained
                }
                None => {
                    let bytes = self.block_bytes_for(index, request)?;
                    let block = self.table.install(index, MemoryBlock::new(bytes)?);
                    debug!(index, bytes, requested = request.bytes, "grew block table");
                    block
                }
            };

            if let Ok(ptr) = block.try_allocate(request) {
                self.table.activate(index);
                return Ok(ptr);
            }
            index += 1;
        }
    }

    /// `max(initial << index, next_power_of_two(span))`.
    ///
    /// The span already includes alignment slack, so a block of this size
    /// always fits the request that caused it.
    fn block_bytes_for(&self, index: usize, request: &Request) -> Result<usize, ArenaError> {
        let doubled = u32::try_from(index)
            .ok()
            .and_then(|shift| 1usize.checked_shl(shift))
            .and_then(|factor| factor.checked_mul(self.config.initial_block_bytes));
        let fit = request.span.checked_next_power_of_two();
        match (doubled, fit) {
            (Some(doubled), Some(fit)) => Ok(doubled.max(fit)),
            _ => Err(ArenaError::ResourceExhausted {
                requested: request.bytes,
                cause: ExhaustionCause::SizeOverflow,
            }),
        }
    }

    /// Return an allocation early.
    ///
    /// A no-op unless [`ArenaConfig::enable_block_free`] is set. When it
    /// is, a pointer inside the current `best` block decrements that
    /// block's live count, and the block is reset in place once it reaches
    /// zero. Pointers in any other block are accepted and ignored.
    pub fn free(&self, ptr: NonNull<u8>) {
        if !self.config.enable_block_free {
            return;
        }
        let _guard = self.lock.lock();
        let best = self.table.best();
        let Some(block) = self.table.get(best) else {
            return;
        };
        if block.contains(ptr) && block.release_one() {
            trace!(index = best, "drained block reset in place");
        }
    }

    /// Reclaim everything allocated since the previous rewind.
    ///
    /// Advances the registry generation, releases blocks above `used`
    /// (grown but not drawn from this cycle), resets the rest, and points
    /// every cursor back at block 0.
    pub fn rewind(&mut self) -> Result<(), ArenaError> {
        self.ensure_quiescent(LifecycleOp::Rewind)?;
        if self.disposed {
            return Err(ArenaError::Disposed);
        }

        self.handle = match self.registry.advance(self.handle) {
            Some(handle) => handle,
            None => self.registry.register()?,
        };
        let used = self.table.used();
        let released = self.table.release_above(used);
        self.table.reset_through(used);
        self.table.reset_cursors();

        debug!(
            generation = %self.handle.generation(),
            kept = used + 1,
            released,
            "arena rewound"
        );
        Ok(())
    }

    /// Release every block and the table itself.
    ///
    /// Afterwards allocation fails with `Disposed` until
    /// [`reinitialize`](Self::reinitialize). Disposing twice is a no-op.
    pub fn dispose(&mut self) -> Result<(), ArenaError> {
        self.ensure_quiescent(LifecycleOp::Dispose)?;
        if self.disposed {
            return Ok(());
        }

        let blocks = self.table.occupied();
        self.table.release_all();
        self.registry.release(self.handle);
        self.disposed = true;
        debug!(slot = self.handle.slot(), blocks, "arena disposed");
        Ok(())
    }

    /// Recreate block 0 and a fresh registry slot after a dispose.
    ///
    /// A no-op on a live arena.
    pub fn reinitialize(&mut self) -> Result<(), ArenaError> {
        self.ensure_quiescent(LifecycleOp::Reinitialize)?;
        if !self.disposed {
            return Ok(());
        }

        let table = Self::initial_table(&self.config)?;
        self.handle = self.registry.register()?;
        self.table = table;
        self.disposed = false;
        debug!(slot = self.handle.slot(), "arena reinitialized");
        Ok(())
    }

    fn ensure_quiescent(&self, operation: LifecycleOp) -> Result<(), ArenaError> {
        match self.work.active() {
            0 => Ok(()),
            active_work => Err(ArenaError::InvalidLifecycleCall {
                operation,
                active_work,
            }),
        }
    }

    /// Tracker that allocation-capable tasks register with.
    pub fn work_tracker(&self) -> &WorkTracker {
        &self.work
    }

    /// Opaque token for containers to store instead of `&RewindArena`.
    pub fn handle(&self) -> ArenaHandle {
        self.handle
    }

    /// Registry generation; advances on every rewind.
    pub fn generation(&self) -> Generation {
        self.handle.generation()
    }

    /// Registry this arena's handle lives in.
    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// The configuration the arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of blocks currently holding storage.
    pub fn blocks_allocated(&self) -> usize {
        self.table.occupied()
    }

    /// Size of block 0 as configured.
    pub fn initial_size_bytes(&self) -> usize {
        self.config.initial_block_bytes
    }

    /// Sum of the capacities of every block holding storage.
    pub fn capacity_bytes(&self) -> usize {
        self.table.iter().map(|(_, block)| block.capacity()).sum()
    }

    /// Bytes consumed this cycle, including padding.
    pub fn used_bytes(&self) -> usize {
        self.table.iter().map(|(_, block)| block.used()).sum()
    }

    /// Block index and byte offset of `ptr`, if it points into this arena.
    pub fn locate(&self, ptr: NonNull<u8>) -> Option<(usize, usize)> {
        self.table
            .iter()
            .find_map(|(index, block)| block.offset_of(ptr).map(|offset| (index, offset)))
    }

    /// Snapshot of every block and the table cursors.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            blocks: self
                .table
                .iter()
                .map(|(index, block)| BlockStats {
                    index,
                    capacity: block.capacity(),
                    used: block.used(),
                    live: block.live_count(),
                })
                .collect(),
            best: self.table.best(),
            last: self.table.last(),
            used: self.table.used(),
            generation: self.generation(),
        }
    }
}

impl ScratchAllocator for RewindArena {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        RewindArena::allocate(self, size, align)
    }

    fn free(&self, ptr: NonNull<u8>) {
        RewindArena::free(self, ptr)
    }

    fn handle(&self) -> ArenaHandle {
        self.handle
    }
}

impl Drop for RewindArena {
    fn drop(&mut self) {
        if !self.disposed {
            self.registry.release(self.handle);
        }
    }
}

impl fmt::Debug for RewindArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewindArena")
            .field("handle", &self.handle)
            .field("blocks", &self.blocks_allocated())
            .field("capacity_bytes", &self.capacity_bytes())
            .field("used_bytes", &self.used_bytes())
            .field("disposed", &self.disposed)
            .finish()
    }
}
