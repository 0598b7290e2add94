//! Contiguous memory blocks with lock-free bump suballocation.
//!
//! A [`MemoryBlock`] owns one fixed-size region. Threads carve it up with a
//! single `fetch_add` on the block's offset, so concurrent callers always
//! receive disjoint ranges without coordinating further. Every range is
//! over-aligned to [`CACHE_LINE_SIZE`] so neighbouring allocations never
//! share a cache line.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use tidal_core::{ArenaError, ExhaustionCause};

use crate::raw::RawBuffer;

/// Minimum alignment of every allocation and of every block's base.
pub const CACHE_LINE_SIZE: usize = 64;

/// The block does not have room for the request.
///
/// Internal signal only; the allocator always recovers by scanning other
/// blocks or growing the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockOverflow;

/// A validated allocation request.
///
/// Computed once per `allocate` call and reused for every block tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Request {
    /// Bytes the caller needs. Zero-byte requests are served as one byte.
    pub(crate) bytes: usize,
    /// Effective alignment: `max(requested, CACHE_LINE_SIZE)`.
    pub(crate) align: usize,
    /// Bytes reserved from the block offset, including alignment slack.
    pub(crate) span: usize,
}

impl Request {
    pub(crate) fn new(size: usize, align: usize) -> Result<Self, ArenaError> {
        if !align.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment { align });
        }
        let bytes = size.max(1);
        let align = align.max(CACHE_LINE_SIZE);
        // Block offsets are always multiples of the cache line, so aligning
        // up to a larger boundary wastes at most `align - CACHE_LINE_SIZE`.
        let span = bytes
            .checked_next_multiple_of(align)
            .and_then(|rounded| rounded.checked_add(align - CACHE_LINE_SIZE))
            .ok_or(ArenaError::ResourceExhausted {
                requested: size,
                cause: ExhaustionCause::SizeOverflow,
            })?;
        Ok(Self { bytes, align, span })
    }
}

/// One contiguous region with an atomic bump offset and live counter.
pub struct MemoryBlock {
    storage: RawBuffer,
    /// Next free byte. May run past capacity after failed reservations;
    /// nothing beyond capacity is ever handed out.
    offset: AtomicUsize,
    /// Allocations handed out and not yet freed individually.
    live: AtomicUsize,
}

impl MemoryBlock {
    /// Allocate a new block of `capacity` bytes from the system allocator.
    pub(crate) fn new(capacity: usize) -> Result<Self, ArenaError> {
        let storage = RawBuffer::try_new(capacity, CACHE_LINE_SIZE).ok_or(
            ArenaError::ResourceExhausted {
                requested: capacity,
                cause: ExhaustionCause::SystemAllocator {
                    block_bytes: capacity,
                },
            },
        )?;
        Ok(Self {
            storage,
            offset: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
        })
    }

    /// Reserve room for `request` without taking any lock.
    ///
    /// The live counter is raised before the offset is bumped and dropped
    /// again on overflow; [`release_one`](Self::release_one) relies on that
    /// order to never reset a block under a reservation in progress.
    pub(crate) fn try_allocate(&self, request: &Request) -> Result<NonNull<u8>, BlockOverflow> {
        let capacity = self.capacity();
        // Cheap precheck: skip the reservation when even an unpadded fit is
        // impossible, so hopeless requests do not burn block space.
        if self.offset.load(Ordering::Relaxed).saturating_add(request.bytes) > capacity {
            return Err(BlockOverflow);
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        let begin = self.offset.fetch_add(request.span, Ordering::SeqCst);
        let base = self.storage.addr();
        let aligned = (base + begin).next_multiple_of(request.align) - base;

        match aligned.checked_add(request.bytes) {
            Some(end) if end <= capacity => Ok(self.storage.ptr_at(aligned)),
            _ => {
                self.live.fetch_sub(1, Ordering::SeqCst);
                Err(BlockOverflow)
            }
        }
    }

    /// Whether `ptr` lies in the part of this block handed out so far.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr).is_some_and(|offset| offset < self.used())
    }

    /// Byte offset of `ptr` from the block base, if it points inside the
    /// region at all.
    pub fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        self.storage.offset_of(ptr)
    }

    /// Record one individual free. Returns `true` if that drained the block
    /// and its offset was reset to zero.
    ///
    /// Must be called with the allocator's spinlock held. Allocations racing
    /// on the fast path are never invalidated: the reset only lands if no
    /// reservation was started between draining and resetting.
    pub(crate) fn release_one(&self) -> bool {
        let drained = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok_and(|prev| prev == 1);
        if !drained {
            return false;
        }
        let observed = self.offset.load(Ordering::SeqCst);
        if self.live.load(Ordering::SeqCst) != 0 {
            return false;
        }
        self.offset
            .compare_exchange(observed, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Forget every allocation, keeping the storage.
    pub(crate) fn reset(&mut self) {
        *self.offset.get_mut() = 0;
        *self.live.get_mut() = 0;
    }

    /// Total size of the region in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes consumed so far, including padding and abandoned reservations.
    pub fn used(&self) -> usize {
        self.offset.load(Ordering::Acquire).min(self.capacity())
    }

    /// Allocations not yet individually freed.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}
