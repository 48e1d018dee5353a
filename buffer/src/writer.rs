//! Sequential writer over a chunked [List].

use crate::{Allocator, List, OwnedBuffer, System};
use std::{fmt, io};
use tracing::debug;

/// A write cursor that fills the chunks of a [List] in order.
///
/// When the list is exhausted, a new chunk of `grow` bytes is appended (if `grow` is
/// non-zero). Once a write cannot be completed, either because the list is exhausted and
/// cannot grow or because growing failed, the writer becomes invalid and every later write
/// is dropped (returning zero). Encoders can keep writing without checking each call; the
/// caller checks [Writer::is_valid] once at the end.
pub struct Writer<'a, A: Allocator = System> {
    list: &'a mut List<OwnedBuffer>,
    allocator: A,
    grow: usize,

    /// Index of the chunk being filled.
    next: usize,
    /// Position within that chunk.
    offset: usize,

    written: usize,
    valid: bool,
}

impl<'a> Writer<'a, System> {
    /// Write into `list`, appending `grow`-byte chunks from the system allocator as needed.
    pub fn new(list: &'a mut List<OwnedBuffer>, grow: usize) -> Self {
        Self::with_allocator(list, grow, System)
    }
}

impl<'a, A: Allocator> Writer<'a, A> {
    /// Write into `list`, appending `grow`-byte chunks from `allocator` as needed.
    pub fn with_allocator(list: &'a mut List<OwnedBuffer>, grow: usize, allocator: A) -> Self {
        Self {
            list,
            allocator,
            grow,
            next: 0,
            offset: 0,
            written: 0,
            valid: true,
        }
    }

    /// Copy `data` into the list, returning the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.fill(data)
    }

    /// Returns `false` once any write has been cut short.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Total bytes accepted.
    pub fn written(&self) -> usize {
        self.written
    }

    fn fill(&mut self, mut data: &[u8]) -> usize {
        if !self.valid {
            return 0;
        }
        let mut written = 0;
        while !data.is_empty() {
            if self.next == self.list.len() && !self.extend() {
                debug!(
                    written = self.written + written,
                    dropped = data.len(),
                    "buffer list exhausted"
                );
                self.valid = false;
                break;
            }
            let chunk = &mut self.list.chunks_mut()[self.next];
            let n = (chunk.len() - self.offset).min(data.len());
            chunk[self.offset..self.offset + n].copy_from_slice(&data[..n]);
            self.offset += n;
            if self.offset == chunk.len() {
                self.next += 1;
                self.offset = 0;
            }
            data = &data[n..];
            written += n;
        }
        self.written += written;
        written
    }

    /// Append a `grow`-byte chunk, returning `false` if growth is disabled or failed.
    fn extend(&mut self) -> bool {
        if self.grow == 0 {
            return false;
        }
        let chunks = self.list.chunks_mut();
        if chunks.try_reserve(1).is_err() {
            return false;
        }
        let chunk = OwnedBuffer::with_len_in(&self.allocator, self.grow);
        if chunk.is_empty() {
            return false;
        }
        chunks.push(chunk);
        true
    }
}

impl<A: Allocator> io::Write for Writer<'_, A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.fill(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<A: Allocator> fmt::Write for Writer<'_, A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.fill(s.as_bytes()) < s.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}
