//! Request-handling seam.
//!
//! Request objects parse the connection's bytes and produce the response; that work lives
//! outside this crate. The controller only needs to hand each request its events and learn,
//! from the returned [Step], how the request wants to proceed. Because requests answer with
//! a value instead of calling back into the controller, a scheduling pass can never be
//! re-entered from request code.

use crate::Connection;

/// How a request wants to proceed after handling an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep going (or keep waiting for admission).
    Continue,
    /// Cannot make progress without more heap. Only honored while active: the request
    /// stops being serviced and is reconsidered for admission on the next pass.
    Defer,
    /// Finished (or failed). The request is removed from the queue and dropped.
    Finish,
}

/// Progress counters of the response a request is producing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Response-specific state code.
    pub state: u8,
    /// Bytes of header produced.
    pub head: usize,
    /// Bytes of content produced.
    pub content: usize,
    /// Bytes handed to the transport.
    pub sent: usize,
    /// Bytes acknowledged by the peer.
    pub acked: usize,
    /// Bytes written in total (header and content).
    pub written: usize,
}

/// An in-flight request tracked by the queue.
///
/// Data and acknowledgements are delivered in every live state (so headers can be parsed
/// while waiting for admission). [Request::admit] and [Request::poll] are only delivered
/// while the request is active.
pub trait Request: Send + 'static {
    /// The request was admitted to active processing.
    ///
    /// Called again if the request deferred and is admitted a second time. Whether it resumes
    /// or restarts its work is up to the implementation.
    fn admit(&mut self) -> Step;

    /// The peer sent `data`.
    fn data(&mut self, data: &[u8]) -> Step;

    /// The peer acknowledged `len` bytes.
    fn acked(&mut self, len: usize) -> Step;

    /// Periodic tick from the transport.
    fn poll(&mut self) -> Step {
        Step::Continue
    }

    /// Progress of the attached response, if one has been created.
    fn progress(&self) -> Option<Progress> {
        None
    }
}

/// Creates request objects for accepted connections.
pub trait Service: Send + 'static {
    type Connection: Connection;
    type Request: Request;

    /// Create the request object that will own `connection`.
    fn request(&mut self, connection: Self::Connection) -> Self::Request;
}
