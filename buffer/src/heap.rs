//! Heap telemetry and fallible allocation.
//!
//! Small devices cannot treat the heap as infinite: a request for a large block may fail
//! even when plenty of memory is free (because what is free is scattered in small pieces).
//! This module defines the two capabilities the rest of the crate depends on:
//!
//! - [Heap] reports live headroom (total free bytes and the largest allocatable block).
//! - [Allocator] hands out zeroed blocks, returning `None` instead of aborting when a block
//!   cannot be provided.

/// Live heap telemetry supplied by the host environment.
///
/// Values are advisory: they are sampled at decision time and may be stale by the time
/// an allocation is attempted.
pub trait Heap: Send + Sync + 'static {
    /// Bytes currently free.
    fn free(&self) -> usize;

    /// Size of the largest single block that can currently be allocated.
    fn largest_block(&self) -> usize;
}

/// [Heap] for hosted targets that expose no telemetry.
///
/// Reports unlimited headroom, so every heap floor is satisfied.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Heap for Unbounded {
    fn free(&self) -> usize {
        usize::MAX
    }

    fn largest_block(&self) -> usize {
        usize::MAX
    }
}

/// Source of zeroed heap blocks that may fail.
pub trait Allocator {
    /// Allocate exactly `len` zeroed bytes.
    ///
    /// Returns `None` if `len` is zero or the block cannot be provided.
    fn allocate(&self, len: usize) -> Option<Box<[u8]>>;
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, len: usize) -> Option<Box<[u8]>> {
        (**self).allocate(len)
    }
}

/// [Allocator] backed by the global allocator.
///
/// Uses fallible reservation, so an unsatisfiable request returns `None` rather than
/// aborting the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct System;

impl Allocator for System {
    fn allocate(&self, len: usize) -> Option<Box<[u8]>> {
        if len == 0 {
            return None;
        }
        let mut block = Vec::new();
        block.try_reserve_exact(len).ok()?;
        block.resize(len, 0);
        Some(block.into_boxed_slice())
    }
}
