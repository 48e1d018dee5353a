//! Chunked allocation.
//!
//! A [List] satisfies one logical allocation with several smaller, independently allocated
//! chunks. On a fragmented heap, many medium blocks are often available when a single large
//! block is not.

use crate::{Allocator, Backing, Heap, OwnedBuffer, SharedBuffer, System};
use std::slice;
use tracing::trace;

/// Sum of the sizes of `chunks`.
pub fn total_size<B: Backing>(chunks: &[B]) -> usize {
    chunks.iter().map(|chunk| chunk.as_ref().len()).sum()
}

/// An ordered sequence of buffers consumed and produced as a unit.
#[derive(Clone, Debug, Default)]
pub struct List<B: Backing = OwnedBuffer> {
    chunks: Vec<B>,
}

impl<B: Backing> List<B> {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Allocate `total` bytes as chunks of `max_chunk` bytes (the last chunk holds the
    /// remainder). A `max_chunk` of zero allocates a single chunk.
    ///
    /// Returns an empty list if any chunk cannot be allocated. A partial list is never
    /// returned.
    pub fn allocate(total: usize, max_chunk: usize) -> Self {
        Self::allocate_in(&System, total, max_chunk)
    }

    /// Like [Self::allocate], allocating from `allocator`.
    pub fn allocate_in<A: Allocator + ?Sized>(
        allocator: &A,
        total: usize,
        max_chunk: usize,
    ) -> Self {
        let mut list = Self::new();
        if total == 0 {
            return list;
        }
        let chunk = chunk_size(total, max_chunk);
        if list.chunks.try_reserve_exact(total.div_ceil(chunk)).is_err() {
            trace!(total, chunk, "chunk index allocation failed");
            return Self::new();
        }

        let mut remaining = total;
        while remaining > 0 {
            let len = remaining.min(chunk);
            let buffer = OwnedBuffer::with_len_in(allocator, len);
            if buffer.is_empty() {
                trace!(total, remaining, len, "chunk allocation failed");
                return Self::new();
            }
            list.chunks.push(B::from(buffer));
            remaining -= len;
        }
        list
    }

    /// Like [Self::allocate], but skip the attempt when `heap` reports that the chunks
    /// cannot fit.
    pub fn allocate_for<H: Heap + ?Sized>(heap: &H, total: usize, max_chunk: usize) -> Self {
        if total == 0 {
            return Self::new();
        }
        let chunk = chunk_size(total, max_chunk);
        if heap.free() < total || heap.largest_block() < chunk {
            trace!(
                total,
                chunk,
                free = heap.free(),
                largest = heap.largest_block(),
                "insufficient headroom for chunked allocation"
            );
            return Self::new();
        }
        Self::allocate(total, max_chunk)
    }

    /// Sum of the chunk sizes.
    pub fn total_size(&self) -> usize {
        total_size(&self.chunks)
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[B] {
        &self.chunks
    }

    pub fn iter(&self) -> slice::Iter<'_, B> {
        self.chunks.iter()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: B) {
        self.chunks.push(chunk);
    }

    /// Release every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Concatenate the chunks in order.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_size());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk.as_ref());
        }
        out
    }

    pub fn into_inner(self) -> Vec<B> {
        self.chunks
    }

    pub(crate) fn chunks_mut(&mut self) -> &mut Vec<B> {
        &mut self.chunks
    }
}

impl List<OwnedBuffer> {
    /// Freeze the chunks into shared, read-only buffers.
    pub fn share(self) -> List<SharedBuffer> {
        List {
            chunks: self.chunks.into_iter().map(SharedBuffer::from).collect(),
        }
    }
}

impl<B: Backing> From<Vec<B>> for List<B> {
    fn from(chunks: Vec<B>) -> Self {
        Self { chunks }
    }
}

impl<B: Backing> IntoIterator for List<B> {
    type Item = B;
    type IntoIter = std::vec::IntoIter<B>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a, B: Backing> IntoIterator for &'a List<B> {
    type Item = &'a B;
    type IntoIter = slice::Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

fn chunk_size(total: usize, max_chunk: usize) -> usize {
    if max_chunk == 0 {
        total
    } else {
        max_chunk.min(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{self, Budget};
    use commonware_macros::test_traced;
    use test_case::test_case;

    fn sizes<B: Backing>(list: &List<B>) -> Vec<usize> {
        list.iter().map(|chunk| chunk.as_ref().len()).collect()
    }

    #[test_traced]
    fn test_allocate_splits() {
        let list = List::<OwnedBuffer>::allocate(2500, 1000);
        assert_eq!(sizes(&list), vec![1000, 1000, 500]);
        assert_eq!(list.total_size(), 2500);
    }

    #[test_case(1, 1; "single byte")]
    #[test_case(999, 1000; "smaller than chunk")]
    #[test_case(1000, 1000; "exactly one chunk")]
    #[test_case(1001, 1000; "one byte over")]
    #[test_case(4096, 256; "many chunks")]
    #[test_case(4097, 7; "odd chunk")]
    fn test_allocate_sums_to_total(total: usize, max_chunk: usize) {
        let list = List::<OwnedBuffer>::allocate(total, max_chunk);
        assert_eq!(list.total_size(), total);
        assert_eq!(list.len(), total.div_ceil(max_chunk));
        let (last, full) = list.chunks().split_last().unwrap();
        assert!(full.iter().all(|chunk| chunk.len() == max_chunk));
        assert!(last.len() <= max_chunk);
    }

    #[test_case(1; "one byte")]
    #[test_case(2500; "several kilobytes")]
    fn test_allocate_unsplit(total: usize) {
        let list = List::<SharedBuffer>::allocate(total, 0);
        assert_eq!(sizes(&list), vec![total]);
    }

    #[test_traced]
    fn test_allocate_zero() {
        assert!(List::<OwnedBuffer>::allocate(0, 0).is_empty());
        assert!(List::<OwnedBuffer>::allocate(0, 16).is_empty());
    }

    #[test_traced]
    fn test_allocate_discards_partial() {
        // Enough for two chunks but not the third.
        let budget = Budget::new(2000);
        let list = List::<OwnedBuffer>::allocate_in(&budget, 2500, 1000);
        assert!(list.is_empty());
        assert_eq!(list.total_size(), 0);
        assert_eq!(budget.allocations(), 2);
    }

    #[test_traced]
    fn test_allocate_tolerates_fragmentation() {
        // No block larger than 1 KiB is available, but 3 KiB are free in total.
        let budget = Budget::new(3 * 1024).with_max_block(1024);
        assert!(List::<OwnedBuffer>::allocate_in(&budget, 2500, 0).is_empty());
        let list = List::<OwnedBuffer>::allocate_in(&budget, 2500, 1024);
        assert_eq!(sizes(&list), vec![1024, 1024, 452]);
    }

    #[test_traced]
    fn test_allocate_for_checks_headroom() {
        let heap = mocks::Heap::new(4096, 512);
        assert!(List::<OwnedBuffer>::allocate_for(&heap, 2048, 1024).is_empty());
        assert_eq!(
            List::<OwnedBuffer>::allocate_for(&heap, 2048, 512).total_size(),
            2048
        );

        heap.set(1024, 1024);
        assert!(List::<OwnedBuffer>::allocate_for(&heap, 2048, 512).is_empty());
    }

    #[test_traced]
    fn test_share() {
        let mut list = List::<OwnedBuffer>::allocate(6, 4);
        list.chunks_mut()[0].copy_from_slice(b"abcd");
        list.chunks_mut()[1].copy_from_slice(b"ef");
        let shared = list.share();
        assert_eq!(shared.to_vec(), b"abcdef");
        assert!(shared.iter().all(|chunk| chunk.references() == 1));
    }
}
