//! Drive a [Controller](crate::Controller) from asynchronous tasks.
//!
//! # Overview
//!
//! The [Engine] owns the controller outright and applies events from its [Mailbox] one at a
//! time, so transports that deliver connection events from several tasks never touch queue
//! state concurrently and a scheduling pass is never interleaved with another event.
//!
//! Every [Mailbox] method waits for the engine to apply the event and returns the
//! controller's answer. Once the runtime is stopped (or every mailbox is dropped) the engine
//! exits, dropping all queued requests, and further calls fail with
//! [Error::Closed](crate::Error::Closed).

mod config;
pub use config::Config;
mod engine;
pub use engine::Engine;
mod ingress;
pub use ingress::Mailbox;
pub(crate) use ingress::Message;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mocks, Admission, Error, Limits, State};
    use bytes::Bytes;
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Metrics, Runner, Spawner};
    use std::num::NonZeroUsize;

    fn config(limits: Limits) -> Config<mocks::Service, frugal_buffer::mocks::Heap> {
        let mut controller =
            crate::Config::new(mocks::Service, frugal_buffer::mocks::Heap::default());
        controller.limits = limits;
        Config {
            controller,
            mailbox_size: 64,
        }
    }

    fn parallel(max: usize) -> Limits {
        Limits {
            max_parallel: NonZeroUsize::new(max),
            ..Default::default()
        }
    }

    #[test_traced]
    fn test_events_applied_in_order() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (engine, mut mailbox) =
                Engine::new(context.with_label("engine"), config(parallel(1)));
            engine.start();

            let a = mocks::Connection::new(1);
            let b = mocks::Connection::new(2);
            assert_eq!(mailbox.connected(a.clone()).await, Ok(Admission::Accepted));
            assert_eq!(mailbox.connected(b.clone()).await, Ok(Admission::Accepted));
            assert_eq!(mailbox.clients().await, Ok(2));
            assert_eq!(mailbox.queue_length().await, Ok(1));
            assert_eq!(mailbox.active_count().await, Ok(1));

            mailbox.data(1, Bytes::from_static(b"hello")).await.unwrap();
            assert_eq!(a.received(), b"hello");

            // Finishing the first request admits the second
            mailbox.acked(1, 5).await.unwrap();
            assert!(a.released());
            let status = mailbox.status().await.unwrap();
            assert_eq!(status.len(), 1);
            assert_eq!(status.entries[0].id, 2);
            assert_eq!(status.entries[0].state, State::Active);

            mailbox.disconnected(2).await.unwrap();
            assert!(b.released());
            assert_eq!(mailbox.render().await.unwrap(), "status: idle\n");
        });
    }

    #[test_traced]
    fn test_errors_forwarded() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (engine, mut mailbox) =
                Engine::new(context.with_label("engine"), config(Limits::default()));
            engine.start();

            assert_eq!(mailbox.poll(7).await, Err(Error::UnknownConnection(7)));
            mailbox.connected(mocks::Connection::new(7)).await.unwrap();
            assert_eq!(
                mailbox.connected(mocks::Connection::new(7)).await,
                Err(Error::Duplicate(7))
            );
            mailbox.poll(7).await.unwrap();
        });
    }

    #[test_traced]
    fn test_set_limits() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (engine, mut mailbox) =
                Engine::new(context.with_label("engine"), config(parallel(1)));
            engine.start();

            for id in 0..3 {
                mailbox.connected(mocks::Connection::new(id)).await.unwrap();
            }
            assert_eq!(mailbox.active_count().await, Ok(1));
            mailbox.set_limits(parallel(2)).await.unwrap();
            assert_eq!(mailbox.active_count().await, Ok(2));
        });
    }

    #[test_traced]
    fn test_shutdown() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let (engine, mut mailbox) =
                Engine::new(context.with_label("engine"), config(Limits::default()));
            let handle = engine.start();

            let a = mocks::Connection::new(1);
            mailbox.connected(a.clone()).await.unwrap();
            assert!(!a.released());

            context.clone().stop(0, None).await.unwrap();
            handle.await.unwrap();

            // Queued requests are dropped with the engine
            assert!(a.released());
            assert_eq!(mailbox.queue_length().await, Err(Error::Closed));
        });
    }
}
