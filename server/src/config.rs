use std::{num::NonZeroUsize, time::Duration};

/// Admission limits.
///
/// Every limit is independently optional. The defaults (no queue bound, no parallelism cap,
/// no heap floors) admit everything, and setting only [Limits::max_parallel] yields a pure
/// parallelism-count scheduler that never consults the heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of connections waiting for admission.
    ///
    /// `Some(0)` means there is no waiting line: a connection is only accepted if it
    /// would be admitted immediately.
    pub max_queued: Option<usize>,

    /// Maximum number of requests active (or deferred) at once.
    pub max_parallel: Option<NonZeroUsize>,

    /// Free heap required to accept a connection at all.
    pub reject_heap: usize,

    /// Largest allocatable block required to accept a connection at all.
    pub min_block: usize,

    /// Free heap required to accept a connection into the queue.
    pub queue_heap: usize,

    /// Estimated heap used by one active request. Together with
    /// [Limits::queue_heap], the headroom needed to keep more than one request active.
    pub request_heap: usize,
}

impl Limits {
    /// Headroom needed before a second (or later) request is admitted.
    pub fn keep_active(&self) -> usize {
        self.request_heap.saturating_add(self.queue_heap)
    }
}

/// What to do with a connection that arrives below the reject floor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overload {
    /// Reset the connection without a response.
    Close,
    /// Reply with a static `503 Service Unavailable` (no allocation) and close.
    #[default]
    Respond,
}

/// Configuration for the [`Controller`](crate::Controller).
pub struct Config<S, H> {
    /// Creates request objects for accepted connections.
    pub service: S,

    /// Heap telemetry consulted by the accept policy and the scheduler.
    pub heap: H,

    /// Admission limits (can be changed later with `set_limits`).
    pub limits: Limits,

    /// Behavior below the reject floor.
    pub overload: Overload,

    /// Value of the `Retry-After` header sent when the queue is full.
    pub retry_after: Duration,

    /// Read timeout applied to every accepted connection.
    pub read_timeout: Duration,

    /// Size of the scratch buffer used to render the status dump.
    pub status_size: usize,

    /// Maximum number of rejected connections waiting to receive their response. Beyond
    /// this, rejected connections are closed without one.
    pub max_rejected: usize,
}

impl<S, H> Config<S, H> {
    /// Unlimited configuration for `service`, observing `heap`.
    pub fn new(service: S, heap: H) -> Self {
        Self {
            service,
            heap,
            limits: Limits::default(),
            overload: Overload::default(),
            retry_after: Duration::from_secs(1),
            read_timeout: Duration::from_secs(3),
            status_size: 2048,
            max_rejected: 16,
        }
    }
}
