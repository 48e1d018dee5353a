//! Admission control for a memory-constrained HTTP server.
//!
//! A small device can only service a handful of requests at once, and how many depends on
//! how much heap is free at the moment rather than on a fixed number. The [Controller]
//! decides, for every new connection, whether to serve it, queue it, or turn it away, and
//! admits queued requests to active processing as heap and parallelism allow:
//!
//! - Below the reject floor, a connection never gets a request object. It is either reset or
//!   answered with a static `503` that needs no allocation ([Overload]).
//! - When the waiting line is full, the connection receives a `503` with a `Retry-After` hint.
//! - Otherwise the request is queued and a scheduling pass runs.
//!
//! A scheduling pass admits queued requests in arrival order until the parallelism cap is
//! reached or the heap cannot sustain another active request. The first request is always
//! admitted regardless of heap, so the server keeps making progress when memory is tight.
//! An active request may defer itself when it runs out of heap; deferred requests keep their
//! slot until the end of the pass and are then reconsidered.
//!
//! Requests answer every event with a [Step] instead of calling back into the controller, so
//! a pass can never re-enter itself. The [coordinator] wraps the controller in an actor for
//! hosts that deliver events from more than one task.
//!
//! # Status
//!
//! `frugal-server` is **ALPHA** software and is not yet recommended for production use.

pub mod config;
pub use config::{Config, Limits, Overload};
mod controller;
pub use controller::{Admission, Controller};
pub mod coordinator;
mod metrics;
#[cfg(test)]
pub mod mocks;
mod queue;
pub use queue::{Counts, State};
pub mod reject;
mod request;
pub use request::{Progress, Request, Service, Step};
pub mod status;
pub use status::Status;
mod transport;
pub use transport::{Connection, Id};

use thiserror::Error;

/// Errors that can occur when delivering events.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unknown connection: {0}")]
    UnknownConnection(Id),
    #[error("duplicate connection: {0}")]
    Duplicate(Id),
    #[error("mailbox closed")]
    Closed,
    #[error("request cancelled")]
    Cancelled,
}
