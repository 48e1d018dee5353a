//! Exclusively owned heap buffer.

use crate::{Allocator, System};
use bytes::Bytes;
use std::{
    fmt,
    ops::{Deref, DerefMut},
    string::FromUtf8Error,
};

/// Storage that can surrender its heap block to an [OwnedBuffer] without copying.
///
/// Implementations return `Err(self)` when the block cannot be taken as-is (for example,
/// when it carries spare capacity that would force a reallocation). Callers then fall back
/// to a fallible copy.
pub trait Release: AsRef<[u8]> + Sized {
    /// Surrender the heap block, or return `self` unchanged.
    fn release(self) -> Result<Box<[u8]>, Self>;
}

impl Release for Box<[u8]> {
    fn release(self) -> Result<Box<[u8]>, Self> {
        Ok(self)
    }
}

impl Release for Vec<u8> {
    fn release(self) -> Result<Box<[u8]>, Self> {
        // Spare capacity would make `into_boxed_slice` shrink (and reallocate) the block.
        if self.is_empty() || self.len() != self.capacity() {
            return Err(self);
        }
        Ok(self.into_boxed_slice())
    }
}

impl Release for String {
    fn release(self) -> Result<Box<[u8]>, Self> {
        if self.is_empty() || self.len() != self.capacity() {
            return Err(self);
        }
        Ok(self.into_bytes().into_boxed_slice())
    }
}

/// A heap-allocated byte buffer that never aborts on allocation failure.
///
/// A failed allocation produces the empty buffer (no block, length zero). There is no
/// other failure representation: a non-empty buffer always owns exactly `len()` bytes.
///
/// Moving an [OwnedBuffer] transfers the block. [Clone] performs a fresh allocation and
/// copy, and yields the empty buffer if that allocation fails.
#[derive(Default, PartialEq, Eq, Hash)]
pub struct OwnedBuffer {
    data: Box<[u8]>,
}

impl OwnedBuffer {
    /// Allocate `len` zeroed bytes from the system allocator.
    pub fn with_len(len: usize) -> Self {
        Self::with_len_in(&System, len)
    }

    /// Allocate `len` zeroed bytes from `allocator`.
    pub fn with_len_in<A: Allocator + ?Sized>(allocator: &A, len: usize) -> Self {
        match allocator.allocate(len) {
            Some(data) if data.len() == len => Self { data },
            _ => Self::default(),
        }
    }

    /// Allocate a copy of `data`.
    pub fn copy_from(data: &[u8]) -> Self {
        Self::copy_from_in(&System, data)
    }

    /// Allocate a copy of `data` from `allocator`.
    pub fn copy_from_in<A: Allocator + ?Sized>(allocator: &A, data: &[u8]) -> Self {
        let mut buffer = Self::with_len_in(allocator, data.len());
        if !buffer.is_empty() {
            buffer.data.copy_from_slice(data);
        }
        buffer
    }

    /// Take ownership of the heap block held by `storage`, copying only if the block
    /// cannot be taken as-is.
    pub fn absorb<S: Release>(storage: S) -> Self {
        Self::absorb_in(&System, storage)
    }

    /// Like [Self::absorb], copying through `allocator` when needed.
    pub fn absorb_in<A: Allocator + ?Sized, S: Release>(allocator: &A, storage: S) -> Self {
        match storage.release() {
            Ok(data) => Self { data },
            Err(storage) => Self::copy_from_in(allocator, storage.as_ref()),
        }
    }

    /// Number of bytes owned.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no block is held (never allocated, released, or failed).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Surrender the block to the caller without freeing it, leaving `self` empty.
    pub fn release(&mut self) -> Box<[u8]> {
        std::mem::take(&mut self.data)
    }

    /// Free the block, leaving `self` empty.
    pub fn clear(&mut self) {
        self.data = Box::default();
    }

    /// Reallocate to `len` bytes, preserving the common prefix.
    ///
    /// Returns the new length on success, or the current length if the allocation failed.
    pub fn resize(&mut self, len: usize) -> usize {
        self.resize_in(&System, len)
    }

    /// Like [Self::resize], allocating from `allocator`.
    pub fn resize_in<A: Allocator + ?Sized>(&mut self, allocator: &A, len: usize) -> usize {
        if len == self.len() {
            return len;
        }
        if len == 0 {
            self.clear();
            return 0;
        }
        let mut next = Self::with_len_in(allocator, len);
        if next.is_empty() {
            return self.len();
        }
        let keep = len.min(self.len());
        next.data[..keep].copy_from_slice(&self.data[..keep]);
        *self = next;
        len
    }

    /// Move the block into a [String] without copying.
    pub fn into_string(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.data.into_vec())
    }
}

impl Clone for OwnedBuffer {
    fn clone(&self) -> Self {
        Self::copy_from(&self.data)
    }
}

impl fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBuffer")
            .field("len", &self.len())
            .finish()
    }
}

impl Deref for OwnedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for OwnedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for OwnedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for OwnedBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl From<&[u8]> for OwnedBuffer {
    fn from(data: &[u8]) -> Self {
        Self::copy_from(data)
    }
}

impl From<Vec<u8>> for OwnedBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::absorb(data)
    }
}

impl From<String> for OwnedBuffer {
    fn from(data: String) -> Self {
        Self::absorb(data)
    }
}

impl From<OwnedBuffer> for Bytes {
    fn from(mut buffer: OwnedBuffer) -> Self {
        Bytes::from(buffer.release())
    }
}
