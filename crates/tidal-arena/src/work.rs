//! Registration of allocation-capable work.
//!
//! The host scheduler enters a [`WorkToken`] for every task that may
//! allocate from an arena, and drops it when the task finishes. Lifecycle
//! operations refuse to run while any token is outstanding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared counter of running allocation-capable tasks.
///
/// Cloning is cheap and every clone observes the same count.
#[derive(Clone, Debug, Default)]
pub struct WorkTracker {
    active: Arc<AtomicUsize>,
}

// Compile-time assertion: tokens travel with the tasks they guard.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<WorkTracker>();
    assert::<WorkToken>();
};

impl WorkTracker {
    /// A tracker with no registered work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one running task. The registration ends when the token drops.
    pub fn enter(&self) -> WorkToken {
        self.active.fetch_add(1, Ordering::AcqRel);
        WorkToken {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of outstanding tokens.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Whether no task is registered.
    pub fn is_idle(&self) -> bool {
        self.active() == 0
    }
}

/// Proof that a task is registered with a [`WorkTracker`].
#[derive(Debug)]
#[must_use = "the task is unregistered as soon as the token is dropped"]
pub struct WorkToken {
    active: Arc<AtomicUsize>,
}

impl Drop for WorkToken {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
