//! Error types for the Tidal allocator.
//!
//! Per-block overflow is an internal signal of the arena crate and never
//! appears here: every variant below is something the caller of
//! `allocate`, `rewind` or `dispose` can actually observe.

use std::error::Error;
use std::fmt;

/// Errors reported by allocator operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// No block can be produced to satisfy the request. Fatal for the
    /// current cycle; callers are expected to abort or shed work.
    ResourceExhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Why growth failed.
        cause: ExhaustionCause,
    },
    /// A lifecycle operation was attempted while allocation-capable work
    /// is still registered as running.
    InvalidLifecycleCall {
        /// The operation that was rejected.
        operation: LifecycleOp,
        /// Number of work tokens outstanding at the time of the call.
        active_work: usize,
    },
    /// Requested alignment is zero or not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// Configuration rejected at construction.
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },
    /// Every slot of the handle registry is taken.
    RegistryFull {
        /// Slot limit of the registry.
        max_slots: u32,
    },
    /// The allocator has been disposed and holds no memory.
    Disposed,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhausted { requested, cause } => {
                write!(f, "resource exhausted: requested {requested} bytes, {cause}")
            }
            Self::InvalidLifecycleCall {
                operation,
                active_work,
            } => {
                write!(
                    f,
                    "{operation} called with {active_work} allocation-capable task(s) still running"
                )
            }
            Self::InvalidAlignment { align } => {
                write!(f, "alignment {align} is not a non-zero power of two")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::RegistryFull { max_slots } => {
                write!(f, "handle registry full ({max_slots} slots)")
            }
            Self::Disposed => write!(f, "allocator has been disposed"),
        }
    }
}

impl Error for ArenaError {}

/// Cause attached to [`ArenaError::ResourceExhausted`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExhaustionCause {
    /// The block table is at its fixed capacity.
    TableFull {
        /// Configured table capacity.
        max_blocks: usize,
    },
    /// The next block size does not fit in `usize`.
    SizeOverflow,
    /// The system allocator returned no memory for a new block.
    SystemAllocator {
        /// Size of the block that could not be obtained.
        block_bytes: usize,
    },
}

impl fmt::Display for ExhaustionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull { max_blocks } => {
                write!(f, "block table full ({max_blocks} blocks)")
            }
            Self::SizeOverflow => write!(f, "block size overflows usize"),
            Self::SystemAllocator { block_bytes } => {
                write!(f, "system allocator refused a {block_bytes}-byte block")
            }
        }
    }
}

/// Allocator lifecycle operations that must run without concurrent work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleOp {
    /// End-of-cycle reclamation.
    Rewind,
    /// Final release of all storage.
    Dispose,
    /// Re-creation of storage after a dispose.
    Reinitialize,
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rewind => write!(f, "rewind"),
            Self::Dispose => write!(f, "dispose"),
            Self::Reinitialize => write!(f, "reinitialize"),
        }
    }
}
