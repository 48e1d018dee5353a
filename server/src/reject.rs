//! Connections turned away by the accept policy.
//!
//! A rejected connection never gets a request object. It waits for the client to send
//! something (so the response is not mistaken for a premature reply), receives a `503`, and
//! is closed once the transport reports the response acknowledged.

use crate::{Connection, Id};
use frugal_buffer::{Allocator, OwnedBuffer, View};
use std::{fmt::Write as _, time::Duration};
use tracing::{trace, warn};

/// Response sent when the heap is too low to accept anything. Lives in read-only memory so
/// that sending it never allocates.
pub const UNAVAILABLE: &[u8] = b"HTTP/1.1 503 Service Unavailable\r\n\
Connection: close\r\n\
Content-Length: 0\r\n\
\r\n";

/// Longest `Retry-After` response [busy] can render.
const BUSY_CAPACITY: usize = 160;

/// Render the response sent when the queue is full, in a single allocation.
///
/// Returns `None` if the allocation fails; the caller falls back to [UNAVAILABLE].
pub fn busy<A: Allocator + ?Sized>(
    allocator: &A,
    retry_after: Duration,
) -> Option<View<OwnedBuffer>> {
    let mut cursor = View::new(OwnedBuffer::with_len_in(allocator, BUSY_CAPACITY));
    if cursor.is_empty() {
        warn!("failed to allocate busy response");
        return None;
    }
    write!(
        cursor,
        "HTTP/1.1 503 Service Unavailable\r\n\
         Connection: close\r\n\
         Retry-After: {}\r\n\
         Content-Length: 0\r\n\
         \r\n",
        retry_after.as_secs().max(1)
    )
    .ok()?;

    // Expose exactly the rendered prefix.
    let written = cursor.offset();
    cursor.reset();
    cursor.resize(written);
    Some(cursor)
}

/// Response owed to a rejected connection.
pub enum Response {
    Unavailable,
    Busy(View<OwnedBuffer>),
}

impl Response {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Response::Unavailable => UNAVAILABLE,
            Response::Busy(view) => view.as_slice(),
        }
    }
}

/// A connection waiting to receive its rejection.
pub struct Rejected<C> {
    connection: C,
    response: Response,
    sent: bool,
}

impl<C: Connection> Rejected<C> {
    pub fn new(connection: C, response: Response) -> Self {
        Self {
            connection,
            response,
            sent: false,
        }
    }

    pub fn id(&self) -> Id {
        self.connection.id()
    }

    /// The client sent data: write the response (once). Returns false if the connection
    /// was closed because the transport did not take the whole response.
    pub fn data(&mut self) -> bool {
        if self.sent {
            return true;
        }
        self.sent = true;
        let response = self.response.as_bytes();
        let accepted = self.connection.write(response, true);
        if accepted < response.len() {
            trace!(id = self.id(), accepted, "rejection write failed");
            self.connection.close(true);
            return false;
        }
        true
    }

    /// The response was acknowledged: close.
    pub fn acked(mut self) {
        self.connection.close(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use commonware_macros::test_traced;
    use frugal_buffer::mocks::Budget;

    #[test_traced]
    fn test_busy_response() {
        let view = busy(&frugal_buffer::System, Duration::from_secs(30)).unwrap();
        assert_eq!(
            view.as_slice(),
            b"HTTP/1.1 503 Service Unavailable\r\nConnection: close\r\nRetry-After: 30\r\nContent-Length: 0\r\n\r\n"
        );
    }

    #[test_traced]
    fn test_busy_rounds_up() {
        let view = busy(&frugal_buffer::System, Duration::from_millis(10)).unwrap();
        let text = std::str::from_utf8(view.as_slice()).unwrap();
        assert!(text.contains("Retry-After: 1\r\n"));
    }

    #[test_traced]
    fn test_busy_allocation_failure() {
        let budget = Budget::new(BUSY_CAPACITY - 1);
        assert!(busy(&budget, Duration::from_secs(1)).is_none());
        assert_eq!(budget.allocations(), 0);
    }

    #[test_traced]
    fn test_unavailable_terminated() {
        assert!(UNAVAILABLE.ends_with(b"\r\n\r\n"));
        assert!(UNAVAILABLE.starts_with(b"HTTP/1.1 503 "));
    }

    #[test_traced]
    fn test_written_once() {
        let connection = mocks::Connection::new(1);
        let mut rejected = Rejected::new(connection.clone(), Response::Unavailable);
        assert_eq!(rejected.id(), 1);
        assert!(rejected.data());
        assert!(rejected.data());
        assert_eq!(connection.written(), UNAVAILABLE);
        assert_eq!(connection.closed(), None);

        rejected.acked();
        assert_eq!(connection.closed(), Some(false));
        assert!(connection.released());
    }
}
