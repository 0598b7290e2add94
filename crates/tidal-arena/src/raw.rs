//! Owned, bounds-checked byte regions backing each memory block.
//!
//! This is the only module in the crate allowed to use `unsafe`. Every
//! unsafe block carries a `// SAFETY:` comment. Callers outside this
//! module only ever see offsets and `NonNull<u8>` addresses.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// A heap region of fixed length, released on drop.
///
/// The bytes are never read or written through this type; it only hands
/// out addresses. That is what makes the `Send`/`Sync` impls below sound.
pub(crate) struct RawBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: `RawBuffer` owns its allocation exclusively and exposes no
// references into it, only addresses. Moving it across threads moves
// ownership of the allocation with it.
unsafe impl Send for RawBuffer {}

// SAFETY: all `&self` methods compute addresses from immutable fields;
// no interior mutability and no access to the pointed-to bytes.
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    /// Request `len` bytes aligned to `align` from the global allocator.
    ///
    /// Returns `None` if the layout is invalid, `len` is zero, or the
    /// system allocator has no memory to give.
    pub(crate) fn try_new(len: usize, align: usize) -> Option<Self> {
        let layout = Layout::from_size_align(len, align).ok()?;
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: `layout` has a non-zero size, checked above.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    /// Length of the region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Address of the first byte.
    pub(crate) fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not strictly inside the region.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(
            offset < self.len(),
            "offset {offset} out of bounds for {}-byte region",
            self.len()
        );
        // SAFETY: `offset < len`, so the result stays inside the same
        // allocation and cannot be null.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// Offset of `ptr` within this region, if it points inside it.
    pub(crate) fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.addr())?;
        (offset < self.len()).then_some(offset)
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc::alloc` with exactly this
        // layout and is deallocated only here.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_aligned() {
        let buf = RawBuffer::try_new(256, 64).unwrap();
        assert_eq!(buf.addr() % 64, 0);
        assert_eq!(buf.len(), 256);
    }

    #[test]
    fn zero_length_is_refused() {
        assert!(RawBuffer::try_new(0, 64).is_none());
    }

    #[test]
    fn bad_alignment_is_refused() {
        assert!(RawBuffer::try_new(64, 3).is_none());
    }

    #[test]
    fn offset_of_round_trips_ptr_at() {
        let buf = RawBuffer::try_new(128, 64).unwrap();
        let p = buf.ptr_at(100);
        assert_eq!(buf.offset_of(p), Some(100));
    }

    #[test]
    fn offset_of_rejects_foreign_pointer() {
        let a = RawBuffer::try_new(128, 64).unwrap();
        let b = RawBuffer::try_new(128, 64).unwrap();
        assert_eq!(a.offset_of(b.ptr_at(0)), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn ptr_at_end_panics() {
        let buf = RawBuffer::try_new(64, 64).unwrap();
        let _ = buf.ptr_at(64);
    }
}
