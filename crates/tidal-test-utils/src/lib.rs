//! Test utilities and concurrent harnesses for Tidal development.
//!
//! Provides seeded request [`Workload`]s, a multi-threaded allocation
//! driver ([`hammer`]) that works against any [`ScratchAllocator`], and
//! checks over the recorded ranges ([`assert_disjoint`], [`assert_aligned`]).
//!
//! [`ScratchAllocator`]: tidal_core::ScratchAllocator

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod harness;

pub use fixtures::{AllocRequest, Workload};
pub use harness::{assert_aligned, assert_disjoint, free_all, hammer, AllocRecord};
