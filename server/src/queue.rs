//! Ordered container of in-flight requests.

use crate::{Id, Request};
use std::{collections::VecDeque, fmt};

/// Lifecycle state of a queued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting to be admitted.
    Queued,
    /// Being serviced.
    Active,
    /// Was active, yielded for lack of heap. Counts against the active set until the end of
    /// the current scheduling pass, when it returns to [State::Queued].
    Deferred,
    /// Finished and about to be removed.
    End,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Queued => "queued",
            State::Active => "active",
            State::Deferred => "deferred",
            State::End => "end",
        };
        f.write_str(name)
    }
}

/// A tracked request.
pub struct Entry<R> {
    pub id: Id,
    pub state: State,
    pub request: R,
}

/// Number of entries in each state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub queued: usize,
    pub active: usize,
    pub deferred: usize,
    pub ended: usize,
}

impl Counts {
    /// Entries holding a slot in the active set (active or deferred).
    pub fn busy(&self) -> usize {
        self.active + self.deferred
    }

    /// Entries waiting for admission.
    pub fn waiting(&self) -> usize {
        self.queued
    }
}

/// Requests in arrival order.
///
/// Removing an entry drops it, which releases the request and its connection.
pub struct Queue<R> {
    entries: VecDeque<Entry<R>>,
}

impl<R: Request> Queue<R> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Append `request` in [State::Queued].
    pub fn push(&mut self, id: Id, request: R) {
        self.entries.push_back(Entry {
            id,
            state: State::Queued,
            request,
        });
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Entry<R>> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Remove and return the entry for `id`.
    pub fn remove(&mut self, id: Id) -> Option<Entry<R>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index)
    }

    /// The earliest-arrived entry in [State::Queued].
    pub fn first_queued(&self) -> Option<Id> {
        self.entries
            .iter()
            .find(|entry| entry.state == State::Queued)
            .map(|entry| entry.id)
    }

    /// Return every [State::Deferred] entry to [State::Queued].
    pub fn undefer(&mut self) -> usize {
        let mut count = 0;
        for entry in self.entries.iter_mut() {
            if entry.state == State::Deferred {
                entry.state = State::Queued;
                count += 1;
            }
        }
        count
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for entry in &self.entries {
            match entry.state {
                State::Queued => counts.queued += 1,
                State::Active => counts.active += 1,
                State::Deferred => counts.deferred += 1,
                State::End => counts.ended += 1,
            }
        }
        counts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<R>> {
        self.entries.iter()
    }
}

impl<R: Request> Default for Queue<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use commonware_macros::test_traced;

    fn queue(ids: &[Id]) -> (Queue<mocks::Request>, Vec<mocks::Connection>) {
        let mut queue = Queue::new();
        let mut connections = Vec::new();
        for id in ids {
            let connection = mocks::Connection::new(*id);
            connections.push(connection.clone());
            queue.push(*id, mocks::Request::new(connection));
        }
        (queue, connections)
    }

    #[test_traced]
    fn test_arrival_order() {
        let (mut queue, _) = queue(&[3, 1, 2]);
        assert_eq!(queue.first_queued(), Some(3));
        queue.get_mut(3).unwrap().state = State::Active;
        assert_eq!(queue.first_queued(), Some(1));
        let ids: Vec<_> = queue.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test_traced]
    fn test_counts_and_undefer() {
        let (mut queue, _) = queue(&[1, 2, 3, 4]);
        queue.get_mut(1).unwrap().state = State::Active;
        queue.get_mut(2).unwrap().state = State::Deferred;
        queue.get_mut(4).unwrap().state = State::End;
        let counts = queue.counts();
        assert_eq!(
            counts,
            Counts {
                queued: 1,
                active: 1,
                deferred: 1,
                ended: 1
            }
        );
        assert_eq!(counts.busy(), 2);

        assert_eq!(queue.undefer(), 1);
        assert_eq!(queue.first_queued(), Some(2));
    }

    #[test_traced]
    fn test_remove_drops_request() {
        let (mut queue, connections) = queue(&[1, 2, 3]);
        assert!(queue.remove(2).is_some());
        assert!(queue.remove(2).is_none());
        assert!(!queue.contains(2));
        assert!(connections[1].released());
        assert!(!connections[0].released());
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());

        drop(queue);
        assert!(connections[0].released());
        assert!(connections[2].released());
    }
}
