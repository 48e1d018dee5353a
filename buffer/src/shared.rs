//! Reference-counted buffer.

use crate::{Allocator, OwnedBuffer, Release, System};
use bytes::Bytes;
use std::{fmt, ops::Deref, sync::Arc};

/// A read-only, reference-counted [OwnedBuffer].
///
/// Cloning a [SharedBuffer] adds a reference to the same block; the block is freed when the
/// last reference is dropped. Shared storage is never mutated in place: writers must take a
/// private copy with [SharedBuffer::copy] or [SharedBuffer::into_owned].
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Option<Arc<OwnedBuffer>>,
}

impl SharedBuffer {
    /// Allocate `len` zeroed bytes.
    pub fn with_len(len: usize) -> Self {
        Self::from(OwnedBuffer::with_len(len))
    }

    /// Allocate `len` zeroed bytes from `allocator`.
    pub fn with_len_in<A: Allocator + ?Sized>(allocator: &A, len: usize) -> Self {
        Self::from(OwnedBuffer::with_len_in(allocator, len))
    }

    /// Allocate a copy of `data`.
    pub fn copy_from(data: &[u8]) -> Self {
        Self::from(OwnedBuffer::copy_from_in(&System, data))
    }

    /// Take ownership of the heap block held by `storage` (see [OwnedBuffer::absorb]).
    pub fn absorb<S: Release>(storage: S) -> Self {
        Self::from(OwnedBuffer::absorb(storage))
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |buffer| buffer.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.inner {
            Some(buffer) => buffer.as_slice(),
            None => &[],
        }
    }

    /// Number of handles referencing the block (zero when empty).
    pub fn references(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// Drop this handle's reference, leaving `self` empty.
    pub fn clear(&mut self) {
        self.inner = None;
    }

    /// Allocate a private snapshot of the block.
    pub fn copy(&self) -> OwnedBuffer {
        OwnedBuffer::copy_from(self.as_slice())
    }

    /// Convert into an [OwnedBuffer], taking the block if this is the last reference and
    /// copying it otherwise.
    pub fn into_owned(self) -> OwnedBuffer {
        match self.inner {
            None => OwnedBuffer::default(),
            Some(inner) => Arc::try_unwrap(inner)
                .unwrap_or_else(|shared| OwnedBuffer::copy_from(shared.as_slice())),
        }
    }
}

impl From<OwnedBuffer> for SharedBuffer {
    fn from(buffer: OwnedBuffer) -> Self {
        if buffer.is_empty() {
            return Self::default();
        }
        Self {
            inner: Some(Arc::new(buffer)),
        }
    }
}

impl From<SharedBuffer> for OwnedBuffer {
    fn from(buffer: SharedBuffer) -> Self {
        buffer.into_owned()
    }
}

impl From<SharedBuffer> for Bytes {
    fn from(buffer: SharedBuffer) -> Self {
        if buffer.is_empty() {
            return Bytes::new();
        }
        Bytes::from_owner(buffer)
    }
}

impl Deref for SharedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for SharedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for SharedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for SharedBuffer {}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .field("references", &self.references())
            .finish()
    }
}
