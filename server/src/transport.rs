//! Transport-layer seam.
//!
//! The TCP/TLS transport is an external collaborator. It owns sockets, delivers events
//! (new connection, data, acknowledgement, poll, disconnect) one at a time from a single
//! event loop, and exposes each connection through [Connection].

use std::time::Duration;

/// Opaque identity of a connection, assigned by the transport.
pub type Id = u64;

/// A connection accepted by the transport.
///
/// Dropping a connection releases the controller's handle; it does not imply a close.
pub trait Connection: Send + 'static {
    /// Identity used to route later events for this connection.
    fn id(&self) -> Id;

    /// Close the connection if no data arrives within `timeout`.
    fn set_read_timeout(&mut self, timeout: Duration);

    /// Disable send coalescing.
    fn set_no_delay(&mut self, no_delay: bool);

    /// Queue `data` for sending.
    ///
    /// If `copy` is set, the transport copies `data` before returning, so the caller may
    /// reuse or free it immediately. Returns the number of bytes accepted (zero if the
    /// transport has no room).
    fn write(&mut self, data: &[u8], copy: bool) -> usize;

    /// Close the connection. When `abort` is set, pending data is discarded and the
    /// connection is reset instead of lingering.
    fn close(&mut self, abort: bool);
}
