//! Core types and traits for the Tidal rewind allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! contract between the allocator and the containers that consume it:
//! the opaque [`ArenaHandle`], the [`ArenaError`] taxonomy, and the
//! [`ScratchAllocator`] capability trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::{ArenaError, ExhaustionCause, LifecycleOp};
pub use id::{ArenaHandle, Generation};
pub use traits::ScratchAllocator;
