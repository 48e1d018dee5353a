//! Queue introspection.

use crate::{
    queue::{Counts, Queue},
    Id, Progress, Request, State,
};
use frugal_buffer::{OwnedBuffer, View};
use std::fmt::{self, Write as _};
use tracing::warn;

/// Status of one queued request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub id: Id,
    pub state: State,
    pub progress: Option<Progress>,
}

/// Snapshot of the controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// Entries per state.
    pub counts: Counts,
    /// Rejected connections still waiting to receive their response.
    pub rejected: usize,
    /// Queued requests in arrival order.
    pub entries: Vec<Entry>,
}

impl Status {
    pub(crate) fn capture<R: Request>(queue: &Queue<R>, rejected: usize) -> Self {
        Self {
            counts: queue.counts(),
            rejected,
            entries: queue
                .iter()
                .map(|entry| Entry {
                    id: entry.id,
                    state: entry.state,
                    progress: entry.request.progress(),
                })
                .collect(),
        }
    }

    /// Number of queued requests (in any state).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write a summary line with the queue length and per-state counts, then a line per queued
/// request, to `out`.
///
/// Lines are first rendered into one scratch buffer of `size` bytes; output that does not
/// fit is cut at the last whole character. The summary is written first so it survives a
/// cut.
pub(crate) fn render<R: Request>(
    queue: &Queue<R>,
    size: usize,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    if queue.is_empty() {
        return out.write_str("status: idle\n");
    }
    let mut cursor = View::new(OwnedBuffer::with_len(size));
    if size > 0 && cursor.is_empty() {
        warn!(size, "failed to allocate status buffer");
        return out.write_str("status: buffer failure\n");
    }

    if write_counts(&mut cursor, queue.len(), queue.counts()).is_err() {
        warn!(size, "status buffer too small");
        return out.write_str("status: buffer too small\n");
    }
    for entry in queue.iter() {
        if write_entry(&mut cursor, entry.id, entry.state, entry.request.progress()).is_err() {
            break;
        }
    }

    let text = match std::str::from_utf8(cursor.consumed()) {
        Ok(text) => text,
        Err(err) => {
            let (valid, _) = cursor.consumed().split_at(err.valid_up_to());
            std::str::from_utf8(valid).map_err(|_| fmt::Error)?
        }
    };
    writeln!(out, "status:{text}")
}

fn write_counts(cursor: &mut View<OwnedBuffer>, len: usize, counts: Counts) -> fmt::Result {
    write!(
        cursor,
        "\nqueue {len}: queued {}, active {}, deferred {}, end {}",
        counts.queued, counts.active, counts.deferred, counts.ended
    )
}

fn write_entry(
    cursor: &mut View<OwnedBuffer>,
    id: Id,
    state: State,
    progress: Option<Progress>,
) -> fmt::Result {
    write!(cursor, "\n- request {id}, state {state}")?;
    if let Some(progress) = progress {
        write!(
            cursor,
            " -- response state {}, [{} {} - {} {} {}]",
            progress.state,
            progress.head,
            progress.content,
            progress.sent,
            progress.acked,
            progress.written
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use commonware_macros::test_traced;
    use test_case::test_case;

    #[test_traced]
    fn test_render_idle() {
        let queue = Queue::<mocks::Request>::new();
        let mut out = String::new();
        render(&queue, 2048, &mut out).unwrap();
        assert_eq!(out, "status: idle\n");
    }

    #[test_traced]
    fn test_render_entries() {
        let mut queue = Queue::new();
        queue.push(7, mocks::Request::new(mocks::Connection::new(7)));
        queue.push(9, mocks::Request::new(mocks::Connection::new(9)));
        queue.get_mut(7).unwrap().state = State::Active;

        let mut out = String::new();
        render(&queue, 2048, &mut out).unwrap();
        assert_eq!(
            out,
            "status:\nqueue 2: queued 1, active 1, deferred 0, end 0\n\
             - request 7, state active\n- request 9, state queued\n"
        );
    }

    #[test_traced]
    fn test_render_truncated() {
        let mut queue = Queue::new();
        for id in 0..100 {
            queue.push(id, mocks::Request::new(mocks::Connection::new(id)));
        }

        queue.get_mut(0).unwrap().state = State::Active;

        // Entry lines are cut, the counts survive
        let mut out = String::new();
        render(&queue, 96, &mut out).unwrap();
        assert!(out.starts_with(
            "status:\nqueue 100: queued 99, active 1, deferred 0, end 0\n\
             - request 0, state active\n- request"
        ));
        assert_eq!(out.len(), "status:".len() + 96 + 1);
        assert!(!out.contains("request 99"));
    }

    #[test_case(0; "no buffer")]
    #[test_case(16; "short buffer")]
    fn test_render_buffer_too_small(size: usize) {
        let mut queue = Queue::new();
        queue.push(1, mocks::Request::new(mocks::Connection::new(1)));

        let mut out = String::new();
        render(&queue, size, &mut out).unwrap();
        assert_eq!(out, "status: buffer too small\n");

        // An empty queue needs no buffer
        let mut out = String::new();
        render(&Queue::<mocks::Request>::new(), size, &mut out).unwrap();
        assert_eq!(out, "status: idle\n");
    }

    #[test_traced]
    fn test_capture() {
        let connection = mocks::Connection::new(1);
        let mut queue = Queue::new();
        queue.push(1, mocks::Request::new(connection.clone()));
        queue.push(2, mocks::Request::new(mocks::Connection::new(2)));
        {
            let entry = queue.get_mut(1).unwrap();
            entry.state = State::Active;
            crate::Request::admit(&mut entry.request);
        }

        let status = Status::capture(&queue, 3);
        assert_eq!(status.len(), 2);
        assert_eq!(status.rejected, 3);
        assert_eq!(status.counts.active, 1);
        assert_eq!(status.counts.queued, 1);
        assert!(status.entries[0].progress.is_some());
        assert!(status.entries[1].progress.is_none());
    }
}
