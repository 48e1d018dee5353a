//! Mock heap telemetry and allocators for testing memory pressure.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A [crate::Heap] whose telemetry is set by the test.
///
/// Clones share the same values, so a test can keep a handle and change headroom while
/// another component reads it.
#[derive(Clone, Debug)]
pub struct Heap {
    free: Arc<AtomicUsize>,
    largest: Arc<AtomicUsize>,
}

impl Heap {
    pub fn new(free: usize, largest_block: usize) -> Self {
        Self {
            free: Arc::new(AtomicUsize::new(free)),
            largest: Arc::new(AtomicUsize::new(largest_block)),
        }
    }

    /// Report `free` bytes with a largest block of `largest_block` bytes.
    pub fn set(&self, free: usize, largest_block: usize) {
        self.free.store(free, Ordering::Relaxed);
        self.largest.store(largest_block, Ordering::Relaxed);
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(usize::MAX, usize::MAX)
    }
}

impl crate::Heap for Heap {
    fn free(&self) -> usize {
        self.free.load(Ordering::Relaxed)
    }

    fn largest_block(&self) -> usize {
        self.largest.load(Ordering::Relaxed)
    }
}

/// A [crate::Allocator] with a fixed byte budget.
///
/// Each successful allocation is deducted from the budget and never returned, so the
/// budget models a heap that only shrinks. Requests larger than the remaining budget (or
/// than `max_block`, when set) fail.
#[derive(Debug)]
pub struct Budget {
    remaining: AtomicUsize,
    max_block: usize,
    allocations: AtomicUsize,
}

impl Budget {
    pub fn new(bytes: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(bytes),
            max_block: usize::MAX,
            allocations: AtomicUsize::new(0),
        }
    }

    /// Fail any single request larger than `max_block` (simulating fragmentation).
    pub fn with_max_block(mut self, max_block: usize) -> Self {
        self.max_block = max_block;
        self
    }

    /// Bytes left in the budget.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }
}

impl crate::Allocator for Budget {
    fn allocate(&self, len: usize) -> Option<Box<[u8]>> {
        if len > self.max_block {
            return None;
        }
        self.remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |remaining| {
                remaining.checked_sub(len)
            })
            .ok()?;
        let block = crate::Allocator::allocate(&crate::System, len)?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Some(block)
    }
}
