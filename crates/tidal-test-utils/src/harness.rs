//! Multi-threaded allocation driver and range checks.

use std::ptr::NonNull;
use std::sync::Barrier;
use std::thread;

use crossbeam_channel::unbounded;
use tidal_core::{ArenaError, ScratchAllocator};

use crate::fixtures::Workload;

/// One successful allocation observed by the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocRecord {
    pub addr: usize,
    pub size: usize,
    pub align: usize,
    pub worker: usize,
}

impl AllocRecord {
    /// One past the last byte of the allocation.
    pub fn end(&self) -> usize {
        self.addr + self.size
    }

    /// The allocation's pointer, for handing back to `free`.
    pub fn ptr(&self) -> NonNull<u8> {
        NonNull::new(self.addr as *mut u8).expect("allocators never return null")
    }
}

/// Replay `workload` on `workers` threads at once against `alloc`.
///
/// All workers start behind a barrier to maximise contention. Returns every
/// successful allocation, or the first error any worker saw.
pub fn hammer<A>(
    alloc: &A,
    workers: usize,
    workload: &Workload,
) -> Result<Vec<AllocRecord>, ArenaError>
where
    A: ScratchAllocator + ?Sized,
{
    let (tx, rx) = unbounded();
    let start = Barrier::new(workers);

    thread::scope(|s| {
        for worker in 0..workers {
            let tx = tx.clone();
            let start = &start;
            s.spawn(move || {
                start.wait();
                for req in workload.requests() {
                    let outcome = alloc.allocate(req.size, req.align).map(|ptr| AllocRecord {
                        addr: ptr.as_ptr() as usize,
                        size: req.size,
                        align: req.align,
                        worker,
                    });
                    let failed = outcome.is_err();
                    // Receiver outlives the scope; a send cannot fail.
                    let _ = tx.send(outcome);
                    if failed {
                        return;
                    }
                }
            });
        }
    });
    drop(tx);

    rx.into_iter().collect()
}

/// Hand every recorded allocation back through `free`.
pub fn free_all<A>(alloc: &A, records: &[AllocRecord])
where
    A: ScratchAllocator + ?Sized,
{
    for r in records {
        alloc.free(r.ptr());
    }
}

/// Panic if any two recorded ranges overlap.
pub fn assert_disjoint(records: &[AllocRecord]) {
    let mut sorted: Vec<&AllocRecord> = records.iter().collect();
    sorted.sort_unstable_by_key(|r| r.addr);
    for pair in sorted.windows(2) {
        assert!(
            pair[0].end() <= pair[1].addr,
            "overlap: [{:#x}, {:#x}) from worker {} and [{:#x}, {:#x}) from worker {}",
            pair[0].addr,
            pair[0].end(),
            pair[0].worker,
            pair[1].addr,
            pair[1].end(),
            pair[1].worker,
        );
    }
}

/// Panic if any allocation is not aligned to `max(align, min_align)`.
pub fn assert_aligned(records: &[AllocRecord], min_align: usize) {
    for r in records {
        let align = r.align.max(min_align);
        assert_eq!(
            r.addr % align,
            0,
            "address {:#x} not aligned to {align}",
            r.addr
        );
    }
}
