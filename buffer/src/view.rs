//! Trimmable window over a buffer.

use crate::{Allocator, OwnedBuffer, SharedBuffer, System};
use std::fmt;

/// Storage a [View] can sit on.
pub trait Backing: AsRef<[u8]> + From<OwnedBuffer> + Default {}

impl Backing for OwnedBuffer {}

impl Backing for SharedBuffer {}

/// A logical window over a buffer that can be trimmed from either end without moving data.
///
/// The visible bytes are `buffer[offset()..capacity() - roffset()]`. Trimming never wraps:
/// advancing past the opposite edge clamps, and giving back more than was trimmed stops at
/// the original edge.
///
/// A view over an [OwnedBuffer] owns its storage and can be written through. A view over a
/// [SharedBuffer] shares its storage and is read-only.
#[derive(Clone, Default, Debug)]
pub struct View<B: Backing = OwnedBuffer> {
    buffer: B,
    left: usize,
    right: usize,
}

impl<B: Backing> View<B> {
    /// Create a view covering all of `buffer`.
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            left: 0,
            right: 0,
        }
    }

    /// Allocate `len` zeroed bytes and view all of them.
    pub fn with_len(len: usize) -> Self {
        Self::new(B::from(OwnedBuffer::with_len(len)))
    }

    /// Allocate a copy of `data` and view all of it.
    pub fn copy_from(data: &[u8]) -> Self {
        Self::new(B::from(OwnedBuffer::copy_from(data)))
    }

    /// The visible bytes.
    pub fn as_slice(&self) -> &[u8] {
        let all = self.buffer.as_ref();
        &all[self.left..all.len() - self.right]
    }

    /// Number of visible bytes.
    pub fn len(&self) -> usize {
        self.capacity() - self.left - self.right
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Bytes trimmed from the left.
    pub fn offset(&self) -> usize {
        self.left
    }

    /// Bytes trimmed from the right.
    pub fn roffset(&self) -> usize {
        self.right
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Bytes trimmed from the left, in order.
    pub fn consumed(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.left]
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    /// Make the whole underlying buffer visible again.
    pub fn reset(&mut self) {
        self.left = 0;
        self.right = 0;
    }

    /// Release the underlying buffer and reset the window.
    pub fn clear(&mut self) {
        self.buffer = B::default();
        self.reset();
    }

    /// Trim `count` bytes from the left, or give back `-count` previously trimmed bytes.
    pub fn advance(&mut self, count: isize) {
        if count >= 0 {
            let limit = self.capacity() - self.right;
            self.left = self.left.saturating_add(count.unsigned_abs()).min(limit);
        } else {
            self.left = self.left.saturating_sub(count.unsigned_abs());
        }
    }

    /// Trim `count` bytes from the right, or give back `-count` previously trimmed bytes.
    pub fn radvance(&mut self, count: isize) {
        if count >= 0 {
            let limit = self.capacity() - self.left;
            self.right = self.right.saturating_add(count.unsigned_abs()).min(limit);
        } else {
            self.right = self.right.saturating_sub(count.unsigned_abs());
        }
    }

    /// Set the window to at most `len` bytes by moving the right edge.
    ///
    /// Returns the resulting visible length.
    pub fn resize(&mut self, len: usize) -> usize {
        let available = self.capacity() - self.left;
        self.right = available.saturating_sub(len);
        self.len()
    }

    /// Replace the underlying buffer with one of `len` bytes that starts with the visible
    /// bytes (truncated if `len` is smaller), then reset the window.
    ///
    /// Returns the size of the underlying buffer afterwards, which is unchanged if the
    /// allocation failed.
    pub fn reallocate(&mut self, len: usize) -> usize {
        self.reallocate_in(&System, len)
    }

    /// Like [Self::reallocate], allocating from `allocator`.
    pub fn reallocate_in<A: Allocator + ?Sized>(&mut self, allocator: &A, len: usize) -> usize {
        let visible = self.as_slice();
        let next = if len <= visible.len() {
            OwnedBuffer::copy_from_in(allocator, &visible[..len])
        } else {
            let mut next = OwnedBuffer::with_len_in(allocator, len);
            if !next.is_empty() {
                next[..visible.len()].copy_from_slice(visible);
            }
            next
        };
        if !next.is_empty() {
            self.buffer = B::from(next);
            self.reset();
        }
        self.capacity()
    }
}

impl View<OwnedBuffer> {
    /// The visible bytes, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let end = self.buffer.len() - self.right;
        &mut self.buffer[self.left..end]
    }

    /// Copy as much of `data` as fits into the front of the window, then trim it off.
    ///
    /// Returns the number of bytes copied. Used as a bounded write cursor: everything
    /// written so far is available from [View::consumed].
    pub fn put(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.len());
        self.as_mut_slice()[..n].copy_from_slice(&data[..n]);
        self.left += n;
        n
    }
}

impl fmt::Write for View<OwnedBuffer> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.put(s.as_bytes()) < s.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}

impl<B: Backing> AsRef<[u8]> for View<B> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
