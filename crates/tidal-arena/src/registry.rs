//! Slot+generation registry of live allocators.
//!
//! Every arena owns one slot. Rewinding bumps the slot's generation, so a
//! container that stored an [`ArenaHandle`] can tell its storage has been
//! reclaimed by comparing generations, without holding a reference to the
//! arena. Released slots are reused through a free list.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tidal_core::{ArenaError, ArenaHandle, Generation};

struct Slot {
    generation: Generation,
    occupied: bool,
}

struct Slots {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

/// Table of arena slots, each with its own generation counter.
///
/// Slot indices are `u32`, so a registry never holds more than
/// `u32::MAX` slots; [`with_slot_limit`](Self::with_slot_limit) lowers that.
pub struct Registry {
    inner: Mutex<Slots>,
    max_slots: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self::with_slot_limit(u32::MAX)
    }

    /// Create an empty registry that hands out at most `max_slots` slots.
    pub const fn with_slot_limit(max_slots: u32) -> Self {
        Self {
            inner: Mutex::new(Slots {
                slots: Vec::new(),
                free_list: Vec::new(),
            }),
            max_slots,
        }
    }

    /// Maximum number of slots this registry hands out.
    pub fn slot_limit(&self) -> u32 {
        self.max_slots
    }

    /// The process-wide registry used by [`RewindArena::new`](crate::RewindArena::new).
    pub fn global() -> &'static Registry {
        static GLOBAL: Registry = Registry::new();
        &GLOBAL
    }

    // Nothing panics while the lock is held, so a poisoned lock still
    // guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a slot and return a handle at its current generation.
    ///
    /// Fails with `RegistryFull` once every slot up to the limit is live
    /// or retired.
    pub fn register(&self) -> Result<ArenaHandle, ArenaError> {
        let mut inner = self.lock();
        if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.occupied = true;
            return Ok(ArenaHandle::new(index, slot.generation));
        }
        let index = u32::try_from(inner.slots.len())
            .ok()
            .filter(|&index| index < self.max_slots)
            .ok_or(ArenaError::RegistryFull {
                max_slots: self.max_slots,
            })?;
        inner.slots.push(Slot {
            generation: Generation::ZERO,
            occupied: true,
        });
        Ok(ArenaHandle::new(index, Generation::ZERO))
    }

    /// Move a live slot to its next generation.
    ///
    /// Returns the new handle, or `None` if `handle` is stale.
    pub fn advance(&self, handle: ArenaHandle) -> Option<ArenaHandle> {
        let mut inner = self.lock();
        let slot = inner.slots.get_mut(handle.slot() as usize)?;
        if !slot.occupied || slot.generation != handle.generation() {
            return None;
        }
        let next = handle.advanced();
        slot.generation = next.generation();
        Some(next)
    }

    /// Give a slot back. Returns `false` if `handle` is stale.
    ///
    /// The generation is bumped so outstanding handles go stale. A slot
    /// whose generation wraps to zero is retired instead of recycled, so a
    /// handle from the slot's first epoch can never match again.
    pub fn release(&self, handle: ArenaHandle) -> bool {
        let mut inner = self.lock();
        let Some(slot) = inner.slots.get_mut(handle.slot() as usize) else {
            return false;
        };
        if !slot.occupied || slot.generation != handle.generation() {
            return false;
        }
        slot.occupied = false;
        slot.generation = slot.generation.next();
        if slot.generation != Generation::ZERO {
            inner.free_list.push(handle.slot());
        }
        true
    }

    /// Whether `handle` still names a live slot at its current generation.
    pub fn is_current(&self, handle: ArenaHandle) -> bool {
        let inner = self.lock();
        inner
            .slots
            .get(handle.slot() as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == handle.generation())
    }

    /// Current handle of a live slot.
    pub fn current(&self, slot: u32) -> Option<ArenaHandle> {
        let inner = self.lock();
        let s = inner.slots.get(slot as usize)?;
        s.occupied.then(|| ArenaHandle::new(slot, s.generation))
    }

    /// Number of live slots.
    pub fn live_count(&self) -> usize {
        self.lock().slots.iter().filter(|s| s.occupied).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_current() {
        let registry = Registry::new();
        let h = registry.register().unwrap();
        assert!(registry.is_current(h));
        assert_eq!(registry.current(h.slot()), Some(h));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn advance_invalidates_previous_handle() {
        let registry = Registry::new();
        let h0 = registry.register().unwrap();
        let h1 = registry.advance(h0).unwrap();
        assert_eq!(h1.slot(), h0.slot());
        assert_eq!(h1.generation(), Generation(1));
        assert!(!registry.is_current(h0));
        assert!(registry.is_current(h1));
        // Advancing with the stale handle is refused.
        assert_eq!(registry.advance(h0), None);
    }

    #[test]
    fn release_is_idempotent() {
        let registry = Registry::new();
        let h = registry.register().unwrap();
        assert!(registry.release(h));
        assert!(!registry.release(h));
        assert!(!registry.is_current(h));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn released_slot_is_reused_with_new_generation() {
        let registry = Registry::new();
        let h1 = registry.register().unwrap();
        registry.release(h1);
        let h2 = registry.register().unwrap();
        assert_eq!(h1.slot(), h2.slot());
        assert_ne!(h1.generation(), h2.generation());
        assert!(!registry.is_current(h1));
        assert!(registry.is_current(h2));
    }

    #[test]
    fn unknown_slot_is_not_current() {
        let registry = Registry::new();
        assert!(!registry.is_current(ArenaHandle::new(42, Generation::ZERO)));
        assert_eq!(registry.current(42), None);
    }

    #[test]
    fn wrapped_slot_is_retired() {
        let registry = Registry::new();
        let h = registry.register().unwrap();
        registry.lock().slots[0].generation = Generation(u32::MAX);
        let h = ArenaHandle::new(h.slot(), Generation(u32::MAX));
        assert!(registry.release(h));
        assert!(registry.lock().free_list.is_empty());

        let fresh = registry.register().unwrap();
        assert_ne!(fresh.slot(), 0, "retired slot must not be reused");
        assert!(!registry.is_current(ArenaHandle::new(0, Generation::ZERO)));
    }

    #[test]
    fn slot_limit_refuses_new_slots() {
        let registry = Registry::with_slot_limit(1);
        let h = registry.register().unwrap();
        assert_eq!(
            registry.register(),
            Err(ArenaError::RegistryFull { max_slots: 1 })
        );
        // A released slot is recycled without counting against the limit.
        registry.release(h);
        assert!(registry.register().is_ok());
    }

    #[test]
    fn retired_slots_count_against_limit() {
        let registry = Registry::with_slot_limit(1);
        let h = registry.register().unwrap();
        registry.lock().slots[0].generation = Generation(u32::MAX);
        assert!(registry.release(ArenaHandle::new(h.slot(), Generation(u32::MAX))));
        assert!(registry.register().is_err());
    }
}
