//! Fixed-capacity block table with the `best`/`last`/`used` cursors.
//!
//! Slots are write-once per cycle: a slot is filled under the allocator's
//! spinlock and only emptied through `&mut self` (rewind, dispose). That is
//! what lets the fast path read `slots[best]` with no lock at all.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::block::MemoryBlock;

/// Ordered collection of [`MemoryBlock`]s plus the cursors that steer
/// allocation.
///
/// - `best`: block the fast path tries first. A hint; may be stale.
/// - `last`: highest index that is part of the current cycle.
/// - `used`: highest index actually allocated from since the last rewind.
///
/// `best <= last` and `used <= last` hold whenever the spinlock is free.
pub(crate) struct BlockTable {
    slots: Box<[OnceLock<MemoryBlock>]>,
    best: AtomicUsize,
    last: AtomicUsize,
    used: AtomicUsize,
}

impl BlockTable {
    /// An empty table with room for `max_blocks` blocks.
    pub(crate) fn new(max_blocks: usize) -> Self {
        Self {
            slots: (0..max_blocks).map(|_| OnceLock::new()).collect(),
            best: AtomicUsize::new(0),
            last: AtomicUsize::new(0),
            used: AtomicUsize::new(0),
        }
    }

    /// Number of slots, occupied or not.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&MemoryBlock> {
        self.slots.get(index)?.get()
    }

    /// Place `block` in the empty slot `index` and return it.
    ///
    /// Caller holds the spinlock and has checked the slot is empty, so the
    /// block is always the one stored.
    pub(crate) fn install(&self, index: usize, block: MemoryBlock) -> &MemoryBlock {
        self.slots[index].get_or_init(move || block)
    }

    pub(crate) fn best(&self) -> usize {
        self.best.load(Ordering::Acquire)
    }

    pub(crate) fn last(&self) -> usize {
        self.last.load(Ordering::Acquire)
    }

    pub(crate) fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    /// An existing block served a slow-path request.
    pub(crate) fn promote(&self, index: usize) {
        self.best.store(index, Ordering::Release);
        self.used.fetch_max(index, Ordering::AcqRel);
    }

    /// Bring a block retained from an earlier cycle back into this one.
    pub(crate) fn extend_to(&self, index: usize) {
        self.last.store(index, Ordering::Release);
    }

    /// A freshly grown (or re-entered) block served a request.
    pub(crate) fn activate(&self, index: usize) {
        self.last.store(index, Ordering::Release);
        self.used.store(index, Ordering::Release);
        self.best.store(index, Ordering::Release);
    }

    /// Blocks currently holding storage.
    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &MemoryBlock)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.get().map(|block| (index, block)))
    }

    /// Release every block above `keep`, returning how many were dropped.
    pub(crate) fn release_above(&mut self, keep: usize) -> usize {
        self.slots
            .iter_mut()
            .skip(keep + 1)
            .filter_map(|slot| slot.take())
            .count()
    }

    /// Reset offsets and live counts of blocks `0..=through`.
    pub(crate) fn reset_through(&mut self, through: usize) {
        for slot in self.slots.iter_mut().take(through + 1) {
            if let Some(block) = slot.get_mut() {
                block.reset();
            }
        }
    }

    pub(crate) fn reset_cursors(&mut self) {
        *self.best.get_mut() = 0;
        *self.last.get_mut() = 0;
        *self.used.get_mut() = 0;
    }

    /// Release every block and the slot storage itself.
    pub(crate) fn release_all(&mut self) {
        *self.used.get_mut() = 0;
        self.release_above(0);
        self.slots = Box::new([]);
        self.reset_cursors();
    }

    pub(crate) fn cursors_consistent(&self) -> bool {
        let last = self.last();
        self.best() <= last && self.used() <= last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(blocks: usize) -> BlockTable {
        let table = BlockTable::new(8);
        for i in 0..blocks {
            table.install(i, MemoryBlock::new(256).unwrap());
        }
        table
    }

    #[test]
    fn new_table_is_empty() {
        let table = BlockTable::new(4);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.occupied(), 0);
        assert!(table.get(0).is_none());
        assert!(table.get(10).is_none());
    }

    #[test]
    fn promote_raises_used_but_never_lowers() {
        let table = table_with(3);
        table.activate(2);
        table.promote(1);
        assert_eq!(table.best(), 1);
        assert_eq!(table.used(), 2);
        assert!(table.cursors_consistent());
    }

    #[test]
    fn release_above_keeps_prefix() {
        let mut table = table_with(4);
        assert_eq!(table.release_above(1), 2);
        assert_eq!(table.occupied(), 2);
        assert!(table.get(2).is_none());
        assert!(table.get(1).is_some());
    }

    #[test]
    fn release_all_drops_slots() {
        let mut table = table_with(2);
        table.activate(1);
        table.release_all();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.occupied(), 0);
        assert_eq!((table.best(), table.last(), table.used()), (0, 0, 0));
    }

    #[test]
    fn iter_skips_empty_slots() {
        let table = BlockTable::new(4);
        table.install(0, MemoryBlock::new(128).unwrap());
        table.install(2, MemoryBlock::new(512).unwrap());
        let seen: Vec<_> = table.iter().map(|(i, b)| (i, b.capacity())).collect();
        assert_eq!(seen, vec![(0, 128), (2, 512)]);
    }
}
