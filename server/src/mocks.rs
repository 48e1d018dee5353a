//! Mock transport connections, requests, and services.

use crate::{Id, Progress, Step};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Debug)]
struct Inner {
    capacity: usize,
    written: Vec<u8>,
    closed: Option<bool>,
    read_timeout: Option<Duration>,
    no_delay: bool,
    admitted: usize,
    admit: Step,
    poll: Step,
    received: Vec<u8>,
    acked: usize,
}

/// A [crate::Connection] that records what the controller did with it.
///
/// Clones share state, so a test can keep a handle after giving the connection away.
#[derive(Clone, Debug)]
pub struct Connection {
    id: Id,
    inner: Arc<Mutex<Inner>>,
}

impl Connection {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            inner: Arc::new(Mutex::new(Inner {
                capacity: usize::MAX,
                written: Vec::new(),
                closed: None,
                read_timeout: None,
                no_delay: false,
                admitted: 0,
                admit: Step::Continue,
                poll: Step::Continue,
                received: Vec::new(),
                acked: 0,
            })),
        }
    }

    /// Accept at most `capacity` bytes per write.
    pub fn with_capacity(self, capacity: usize) -> Self {
        self.inner.lock().unwrap().capacity = capacity;
        self
    }

    /// Step returned by the attached [Request] when admitted.
    pub fn on_admit(&self, step: Step) {
        self.inner.lock().unwrap().admit = step;
    }

    /// Step returned by the attached [Request] when polled.
    pub fn on_poll(&self, step: Step) {
        self.inner.lock().unwrap().poll = step;
    }

    /// Bytes written to the connection.
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    /// `Some(abort)` once closed.
    pub fn closed(&self) -> Option<bool> {
        self.inner.lock().unwrap().closed
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.inner.lock().unwrap().read_timeout
    }

    pub fn no_delay(&self) -> bool {
        self.inner.lock().unwrap().no_delay
    }

    /// Number of times the attached [Request] was admitted.
    pub fn admitted(&self) -> usize {
        self.inner.lock().unwrap().admitted
    }

    /// Data delivered to the attached [Request].
    pub fn received(&self) -> Vec<u8> {
        self.inner.lock().unwrap().received.clone()
    }

    /// Whether every other handle (the controller's) has been dropped.
    pub fn released(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

impl crate::Connection for Connection {
    fn id(&self) -> Id {
        self.id
    }

    fn set_read_timeout(&mut self, timeout: Duration) {
        self.inner.lock().unwrap().read_timeout = Some(timeout);
    }

    fn set_no_delay(&mut self, no_delay: bool) {
        self.inner.lock().unwrap().no_delay = no_delay;
    }

    fn write(&mut self, data: &[u8], _copy: bool) -> usize {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed.is_some() {
            return 0;
        }
        let accepted = data.len().min(inner.capacity);
        inner.written.extend_from_slice(&data[..accepted]);
        accepted
    }

    fn close(&mut self, abort: bool) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed.is_none() {
            inner.closed = Some(abort);
        }
    }
}

/// A [crate::Request] driven by what the client sends.
///
/// Data `b"finish"` finishes the request and `b"defer"` asks to be deferred; anything
/// else is recorded and continues. Every acknowledgement finishes the request.
pub struct Request {
    connection: Connection,
}

impl Request {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl crate::Request for Request {
    fn admit(&mut self) -> Step {
        let mut inner = self.connection.inner.lock().unwrap();
        inner.admitted += 1;
        inner.admit
    }

    fn data(&mut self, data: &[u8]) -> Step {
        match data {
            b"finish" => Step::Finish,
            b"defer" => Step::Defer,
            _ => {
                let mut inner = self.connection.inner.lock().unwrap();
                inner.received.extend_from_slice(data);
                Step::Continue
            }
        }
    }

    fn acked(&mut self, len: usize) -> Step {
        self.connection.inner.lock().unwrap().acked += len;
        Step::Finish
    }

    fn poll(&mut self) -> Step {
        self.connection.inner.lock().unwrap().poll
    }

    fn progress(&self) -> Option<Progress> {
        let inner = self.connection.inner.lock().unwrap();
        if inner.admitted == 0 {
            return None;
        }
        Some(Progress {
            state: 1,
            head: 0,
            content: inner.received.len(),
            sent: inner.written.len(),
            acked: inner.acked,
            written: inner.written.len(),
        })
    }
}

/// A [crate::Service] creating mock [Request]s.
#[derive(Clone, Debug, Default)]
pub struct Service;

impl crate::Service for Service {
    type Connection = Connection;
    type Request = Request;

    fn request(&mut self, connection: Connection) -> Request {
        Request::new(connection)
    }
}
