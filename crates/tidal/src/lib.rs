//! Tidal: thread-safe, bulk-lifetime scratch allocation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tidal sub-crates. For most users, adding `tidal` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tidal::prelude::*;
//!
//! let mut arena = RewindArena::new(ArenaConfig::new(1024)).unwrap();
//!
//! // Allocate from any thread through `&arena`.
//! let a = arena.allocate(64, 8).unwrap();
//! let b = arena.allocate(16, 128).unwrap();
//! assert_eq!(b.as_ptr() as usize % 128, 0);
//! assert_ne!(a, b);
//!
//! // Containers keep the handle, not a reference, and check it later.
//! let stored = arena.handle();
//! assert!(arena.registry().is_current(stored));
//!
//! // Reclaim everything at the end of the cycle.
//! arena.rewind().unwrap();
//! assert!(!arena.registry().is_current(stored));
//! assert_eq!(arena.used_bytes(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `tidal-arena` | `RewindArena`, blocks, registry, work tracking |
//! | [`types`] | `tidal-core` | Errors, handles, generations, `ScratchAllocator` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The rewind allocator and its building blocks (`tidal-arena`).
///
/// Most users only need [`arena::RewindArena`] and [`arena::ArenaConfig`]
/// from this module; both are also in the [`prelude`].
pub use tidal_arena as arena;

/// Errors, handles and the allocator capability trait (`tidal-core`).
///
/// Code that only allocates should depend on
/// [`types::ScratchAllocator`] rather than the concrete arena.
pub use tidal_core as types;

/// Common imports for typical Tidal usage.
///
/// ```rust
/// use tidal::prelude::*;
/// ```
pub mod prelude {
    // Allocator
    pub use tidal_arena::{ArenaConfig, Registry, RewindArena, WorkToken, WorkTracker};

    // Core types and traits
    pub use tidal_core::{ArenaError, ArenaHandle, Generation, ScratchAllocator};
}
