//! Capability trait consumed by arena-backed containers.

use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::id::ArenaHandle;

/// Raw storage provider for short-lived, bulk-reclaimed buffers.
///
/// Containers (arrays, lists, ring buffers, text buffers) obtain their
/// backing bytes through this trait and keep only the [`ArenaHandle`]
/// around. Everything handed out stays valid until the owning allocator
/// is rewound; after that the handle's generation no longer matches.
///
/// Implementations must be callable from many threads at once.
pub trait ScratchAllocator: Send + Sync {
    /// Allocate `size` bytes aligned to at least `align`.
    ///
    /// `align` must be a non-zero power of two. The returned memory is
    /// uninitialised.
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError>;

    /// Return an allocation early.
    ///
    /// Always accepted. Whether anything is actually reclaimed before the
    /// next rewind is up to the implementation.
    fn free(&self, ptr: NonNull<u8>);

    /// Opaque token identifying the allocator and its current generation.
    fn handle(&self) -> ArenaHandle;
}
