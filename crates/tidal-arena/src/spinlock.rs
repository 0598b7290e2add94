//! Busy-wait mutual exclusion for the allocation slow path.
//!
//! The fast path never touches this lock. It serialises block-table scans,
//! growth, and narrow frees, all of which are short.

use std::sync::atomic::{AtomicBool, Ordering};

/// A test-and-test-and-set spinlock.
///
/// No timeout, no reentrancy, no fairness. Locking twice from the same
/// thread deadlocks.
pub struct SpinLock {
    locked: AtomicBool,
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinLock {
    /// Create an unlocked spinlock.
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spin until the lock is held, returning a guard that releases it.
    #[inline]
    pub fn lock(&self) -> SpinGuard<'_> {
        if self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_contended();
        }
        SpinGuard { lock: self }
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    #[cold]
    fn lock_contended(&self) {
        loop {
            // Read-only spin keeps the cache line shared until it is released.
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }
}

/// Holds a [`SpinLock`] until dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guard_releases_on_drop() {
        let lock = SpinLock::new();
        {
            let _g = lock.lock();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
        let _again = lock.lock();
        assert!(lock.is_locked());
    }

    #[test]
    fn serialises_non_atomic_updates() {
        struct Shared {
            lock: SpinLock,
            counter: std::sync::atomic::AtomicUsize,
        }
        let shared = Arc::new(Shared {
            lock: SpinLock::new(),
            counter: std::sync::atomic::AtomicUsize::new(0),
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let _g = shared.lock.lock();
                        // Load/store pair is only correct under mutual exclusion.
                        let v = shared.counter.load(Ordering::Relaxed);
                        shared.counter.store(v + 1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(shared.counter.load(Ordering::Relaxed), 4000);
    }
}
