use crate::{
    config::{Config, Limits, Overload},
    metrics::{Metrics, Outcome},
    queue::{Queue, State},
    reject::{self, Rejected, Response},
    status::{self, Status},
    Connection, Error, Id, Request, Service, Step,
};
use commonware_runtime::Metrics as RuntimeMetrics;
use frugal_buffer::{Heap, System};
use std::{fmt, time::Duration};
use tracing::{debug, trace};

/// What the accept policy did with a new connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Queued (and possibly already admitted or finished; see [Controller::state]).
    Accepted,
    /// Below the reject floor, closed without a response.
    Dropped,
    /// Below a heap floor, will receive the static unavailable response.
    Rejected,
    /// Waiting line full, will receive an unavailable response with a retry hint.
    Busy,
}

/// Owns the request queue and decides which requests run.
///
/// All events for all connections must be delivered through `&mut self`, one at a time.
pub struct Controller<S: Service, H: Heap> {
    service: S,
    heap: H,
    limits: Limits,
    overload: Overload,
    retry_after: Duration,
    read_timeout: Duration,
    status_size: usize,
    max_rejected: usize,

    queue: Queue<S::Request>,
    rejected: Vec<Rejected<S::Connection>>,

    metrics: Metrics,
}

impl<S: Service, H: Heap> Controller<S, H> {
    /// Create a controller, registering its metrics with `context`.
    pub fn new<E: RuntimeMetrics>(context: E, cfg: Config<S, H>) -> Self {
        Self {
            service: cfg.service,
            heap: cfg.heap,
            limits: cfg.limits,
            overload: cfg.overload,
            retry_after: cfg.retry_after,
            read_timeout: cfg.read_timeout,
            status_size: cfg.status_size,
            max_rejected: cfg.max_rejected,
            queue: Queue::new(),
            rejected: Vec::new(),
            metrics: Metrics::init(context),
        }
    }

    /// Apply the accept policy to a new connection.
    pub fn connected(&mut self, mut connection: S::Connection) -> Result<Admission, Error> {
        let id = connection.id();
        if self.queue.contains(id) || self.rejected.iter().any(|r| r.id() == id) {
            return Err(Error::Duplicate(id));
        }

        // Never allocate request state below the reject floor
        if !self.heap_ok(self.limits.reject_heap) {
            return Ok(match self.overload {
                Overload::Close => self.drop_connection(connection),
                Overload::Respond => self.reject(connection, Response::Unavailable),
            });
        }
        if self.limits.queue_heap > 0 && !self.heap_ok(self.limits.queue_heap) {
            return Ok(self.reject(connection, Response::Unavailable));
        }

        // Only turn the connection away if it would have to wait
        if let Some(max_queued) = self.limits.max_queued {
            let counts = self.queue.counts();
            let admissible = counts.waiting() == 0 && self.can_admit(counts.busy());
            if !admissible && counts.waiting() >= max_queued {
                let response = match reject::busy(&System, self.retry_after) {
                    Some(view) => Response::Busy(view),
                    None => Response::Unavailable,
                };
                return Ok(self.reject(connection, response));
            }
        }

        connection.set_read_timeout(self.read_timeout);
        let request = self.service.request(connection);
        self.queue.push(id, request);
        self.metrics.connection(Outcome::Accepted);
        trace!(id, "accepted connection");
        self.schedule();
        Ok(Admission::Accepted)
    }

    /// The client sent data on connection `id`.
    pub fn data(&mut self, id: Id, data: &[u8]) -> Result<(), Error> {
        if let Some(index) = self.rejected_index(id) {
            if !self.rejected[index].data() {
                self.rejected.swap_remove(index);
            }
            return Ok(());
        }
        let entry = self.queue.get_mut(id).ok_or(Error::UnknownConnection(id))?;
        let step = entry.request.data(data);
        if self.apply(id, step) {
            self.schedule();
        }
        Ok(())
    }

    /// The client acknowledged `len` bytes on connection `id`.
    pub fn acked(&mut self, id: Id, len: usize) -> Result<(), Error> {
        if let Some(index) = self.rejected_index(id) {
            trace!(id, "closing rejected connection");
            self.rejected.swap_remove(index).acked();
            return Ok(());
        }
        let entry = self.queue.get_mut(id).ok_or(Error::UnknownConnection(id))?;
        let step = entry.request.acked(len);
        if self.apply(id, step) {
            self.schedule();
        }
        Ok(())
    }

    /// Periodic tick for connection `id`.
    ///
    /// Polls the request if it is active, then runs a scheduling pass so requests that
    /// deferred earlier are reconsidered.
    pub fn poll(&mut self, id: Id) -> Result<(), Error> {
        if self.rejected_index(id).is_some() {
            return Ok(());
        }
        let entry = self.queue.get_mut(id).ok_or(Error::UnknownConnection(id))?;
        if entry.state == State::Active {
            let step = entry.request.poll();
            self.apply(id, step);
        }
        self.schedule();
        Ok(())
    }

    /// Connection `id` went away. Its request (if any) is dropped and the freed slot is
    /// offered to the next queued request.
    pub fn disconnected(&mut self, id: Id) -> Result<(), Error> {
        if let Some(index) = self.rejected_index(id) {
            self.rejected.swap_remove(index);
            return Ok(());
        }
        let entry = self.queue.remove(id).ok_or(Error::UnknownConnection(id))?;
        debug!(id, state = %entry.state, "disconnected");
        drop(entry);
        self.schedule();
        Ok(())
    }

    /// Replace the admission limits, then run a scheduling pass.
    pub fn set_limits(&mut self, limits: Limits) {
        debug!(?limits, "updated limits");
        self.limits = limits;
        self.schedule();
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Number of requests waiting for admission.
    pub fn queue_length(&self) -> usize {
        self.queue.counts().waiting()
    }

    /// Number of tracked requests (in any state). Rejected connections are not included.
    pub fn clients(&self) -> usize {
        self.queue.len()
    }

    /// Number of requests active or deferred.
    pub fn active_count(&self) -> usize {
        self.queue.counts().busy()
    }

    /// State of the request on connection `id`, if it is queued.
    pub fn state(&self, id: Id) -> Option<State> {
        self.queue
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.state)
    }

    /// Structured snapshot of the queue.
    pub fn status(&self) -> Status {
        Status::capture(&self.queue, self.rejected.len())
    }

    /// Write a human-readable dump of the queue to `out`, using one scratch buffer.
    pub fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        status::render(&self.queue, self.status_size, out)
    }

    /// Admit queued requests in arrival order while limits allow, then return deferred
    /// requests to the queue.
    fn schedule(&mut self) {
        while let Some(id) = self.queue.first_queued() {
            let active = self.queue.counts().busy();
            if !self.can_admit(active) {
                trace!(id, active, "admission paused");
                break;
            }
            let Some(entry) = self.queue.get_mut(id) else {
                break;
            };
            entry.state = State::Active;
            self.metrics.admitted.inc();
            debug!(id, active, "admitted");
            let step = entry.request.admit();
            self.apply(id, step);
        }

        let undeferred = self.queue.undefer();
        if undeferred > 0 {
            trace!(undeferred, "requeued deferred requests");
        }
        let counts = self.queue.counts();
        self.metrics.queued.set(counts.waiting() as i64);
        self.metrics.active.set(counts.busy() as i64);
    }

    /// Whether one more request may become active while `active` already are.
    fn can_admit(&self, active: usize) -> bool {
        if let Some(max_parallel) = self.limits.max_parallel {
            if active >= max_parallel.get() {
                return false;
            }
        }
        // The first request always runs
        active == 0 || self.heap.free() >= self.limits.keep_active()
    }

    /// Apply the step returned by request `id`. Returns whether a slot may have opened.
    fn apply(&mut self, id: Id, step: Step) -> bool {
        match step {
            Step::Continue => false,
            Step::Defer => {
                let Some(entry) = self.queue.get_mut(id) else {
                    return false;
                };
                if entry.state != State::Active {
                    return false;
                }
                entry.state = State::Deferred;
                self.metrics.deferred.inc();
                debug!(id, "deferred");
                true
            }
            Step::Finish => {
                let Some(mut entry) = self.queue.remove(id) else {
                    return false;
                };
                entry.state = State::End;
                self.metrics.completed.inc();
                debug!(id, "completed");
                true
            }
        }
    }

    fn heap_ok(&self, floor: usize) -> bool {
        self.heap.free() >= floor && self.heap.largest_block() >= self.limits.min_block
    }

    fn drop_connection(&mut self, mut connection: S::Connection) -> Admission {
        debug!(id = connection.id(), free = self.heap.free(), "dropping connection");
        connection.close(true);
        self.metrics.connection(Outcome::Dropped);
        Admission::Dropped
    }

    fn reject(&mut self, mut connection: S::Connection, response: Response) -> Admission {
        // Tracking a rejection must not grow the heap without bound
        if self.rejected.len() >= self.max_rejected || self.rejected.try_reserve(1).is_err() {
            trace!(rejected = self.rejected.len(), "rejection list full");
            return self.drop_connection(connection);
        }
        let busy = matches!(response, Response::Busy(_));
        debug!(id = connection.id(), busy, "rejecting connection");
        connection.set_read_timeout(self.read_timeout);
        connection.set_no_delay(true);
        self.rejected.push(Rejected::new(connection, response));
        if busy {
            self.metrics.connection(Outcome::Busy);
            Admission::Busy
        } else {
            self.metrics.connection(Outcome::Rejected);
            Admission::Rejected
        }
    }

    fn rejected_index(&self, id: Id) -> Option<usize> {
        self.rejected.iter().position(|r| r.id() == id)
    }
}
