//! Thread-safe, bulk-lifetime bump allocation for Tidal.
//!
//! Callers allocate short-lived buffers many times per cycle and never free
//! them individually; the owner rewinds the whole arena once per cycle.
//! This crate may contain `unsafe` code, confined to `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! RewindArena (allocate / free / rewind / dispose)
//! ├── SpinLock            slow path and growth only
//! ├── BlockTable          fixed capacity, cursors best/last/used
//! │   └── MemoryBlock[]   atomic bump offset + live count
//! │       └── RawBuffer   owned, cache-line aligned region
//! ├── WorkTracker         running allocation-capable tasks
//! └── Registry slot       handle whose generation advances per rewind
//! ```
//!
//! # Safety checks
//!
//! Debug builds, or any build with the `safety-checks` feature, assert
//! alignment and cursor ordering on every allocation. Release builds
//! without the feature compile those checks out.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
mod raw;
pub mod registry;
pub mod spinlock;
pub mod stats;
mod table;
pub mod work;

pub(crate) const SAFETY_CHECKS: bool = cfg!(any(debug_assertions, feature = "safety-checks"));

// Public re-exports for the primary API surface.
pub use arena::RewindArena;
pub use block::{MemoryBlock, CACHE_LINE_SIZE};
pub use config::ArenaConfig;
pub use registry::Registry;
pub use spinlock::{SpinGuard, SpinLock};
pub use stats::{ArenaStats, BlockStats};
pub use tidal_core::{ArenaError, ArenaHandle, ExhaustionCause, Generation, ScratchAllocator};
pub use work::{WorkToken, WorkTracker};
