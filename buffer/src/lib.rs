//! Allocate and move byte buffers without requiring large contiguous blocks.
//!
//! Devices with small heaps (tens to a few hundred kilobytes) fragment quickly: after a
//! while, the heap may hold plenty of free memory but no single block large enough for a
//! big allocation. This crate houses bytes so that failure to allocate is an ordinary,
//! checkable outcome rather than a crash:
//!
//! - [OwnedBuffer] is a move-only heap buffer. A failed allocation yields the empty buffer.
//! - [SharedBuffer] is a reference-counted, read-only [OwnedBuffer].
//! - [View] is a window over either buffer that can be trimmed from both ends without
//!   moving data, and regrown (by reallocation) without losing the visible bytes.
//! - [List] splits one logical allocation into several smaller chunks, and is either
//!   allocated completely or not at all.
//! - [Writer] streams bytes into a [List], growing it on demand, and fails closed once it
//!   runs out of space.
//!
//! Heap telemetry ([Heap]) and fallible allocation ([Allocator]) are capabilities supplied
//! by the host, so the same code runs against a real device heap, the system allocator, or
//! the [mocks] used in tests.
//!
//! # Example
//!
//! ```rust
//! use frugal_buffer::{List, OwnedBuffer, Writer};
//!
//! // Ask for 2500 bytes, but never more than 1000 contiguous bytes at once.
//! let mut list = List::<OwnedBuffer>::allocate(2500, 1000);
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.total_size(), 2500);
//!
//! let mut writer = Writer::new(&mut list, 0);
//! writer.write(b"hello");
//! assert!(writer.is_valid());
//! assert_eq!(&list.to_vec()[..5], b"hello");
//! ```
//!
//! # Status
//!
//! `frugal-buffer` is **ALPHA** software and is not yet recommended for production use.

mod heap;
pub use heap::{Allocator, Heap, System, Unbounded};
mod list;
pub use list::{total_size, List};
pub mod mocks;
mod owned;
pub use owned::{OwnedBuffer, Release};
mod shared;
pub use shared::SharedBuffer;
mod view;
pub use view::{Backing, View};
mod writer;
pub use writer::Writer;
