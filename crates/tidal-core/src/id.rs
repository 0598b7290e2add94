//! Strongly-typed identifiers for allocator instances.

use std::fmt;

/// Version counter of a registry slot.
///
/// Incremented every time the owning allocator is rewound or released.
/// Dependents that stored an older generation know their storage has
/// been reclaimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u32);

impl Generation {
    /// The generation a freshly created slot starts at.
    pub const ZERO: Generation = Generation(0);

    /// The generation that follows this one, wrapping at `u32::MAX`.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token identifying one allocator instance in a registry.
///
/// Containers store a handle instead of a reference to the allocator.
/// The allocator itself never interprets it; resolution and staleness
/// checks belong to whoever owns the registry.
///
/// Packs into a `u64` as `slot << 32 | generation` so it can cross
/// boundaries that only carry integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct ArenaHandle {
    slot: u32,
    generation: Generation,
}

impl ArenaHandle {
    /// Build a handle from its slot index and generation.
    pub fn new(slot: u32, generation: Generation) -> Self {
        Self { slot, generation }
    }

    /// Registry slot this handle refers to.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Same slot, next generation.
    pub fn advanced(self) -> Self {
        Self {
            slot: self.slot,
            generation: self.generation.next(),
        }
    }

    /// Encode as `slot << 32 | generation`.
    pub fn to_bits(self) -> u64 {
        ((self.slot as u64) << 32) | (self.generation.0 as u64)
    }

    /// Decode a value produced by [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u64) -> Self {
        Self {
            slot: (bits >> 32) as u32,
            generation: Generation(bits as u32),
        }
    }
}

impl fmt::Display for ArenaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaHandle(slot={}, gen={})", self.slot, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn advanced_keeps_slot() {
        let h = ArenaHandle::new(7, Generation(3));
        let next = h.advanced();
        assert_eq!(next.slot(), 7);
        assert_eq!(next.generation(), Generation(4));
        assert_ne!(h, next);
    }

    #[test]
    fn generation_wraps() {
        assert_eq!(Generation(u32::MAX).next(), Generation::ZERO);
    }

    #[test]
    fn bits_layout_is_slot_high_generation_low() {
        let h = ArenaHandle::new(1, Generation(2));
        assert_eq!(h.to_bits(), (1u64 << 32) | 2);
    }

    proptest! {
        #[test]
        fn bits_decode_recovers_handle(slot in any::<u32>(), gen in any::<u32>()) {
            let h = ArenaHandle::new(slot, Generation(gen));
            prop_assert_eq!(ArenaHandle::from_bits(h.to_bits()), h);
        }
    }
}
