use crate::{Admission, Error, Id, Limits, Status};
use bytes::Bytes;
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};

/// Message types that can be sent to the `Mailbox`
pub enum Message<C> {
    /// A new connection was accepted by the transport.
    Connected {
        connection: C,
        responder: oneshot::Sender<Result<Admission, Error>>,
    },
    /// The client sent data.
    Data {
        id: Id,
        data: Bytes,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    /// The client acknowledged sent data.
    Acked {
        id: Id,
        len: usize,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    /// Periodic tick for a connection.
    Poll {
        id: Id,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    /// The connection went away.
    Disconnected {
        id: Id,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    /// Replace the admission limits.
    SetLimits {
        limits: Limits,
        responder: oneshot::Sender<()>,
    },
    /// Number of requests waiting for admission.
    QueueLength { responder: oneshot::Sender<usize> },
    /// Number of tracked requests.
    Clients { responder: oneshot::Sender<usize> },
    /// Number of active requests.
    ActiveCount { responder: oneshot::Sender<usize> },
    /// Structured snapshot.
    Status { responder: oneshot::Sender<Status> },
    /// Human-readable dump.
    Render { responder: oneshot::Sender<String> },
}

/// Ingress mailbox for [`Engine`](super::Engine).
///
/// Every method waits for the engine to process the event, so events sent from one task are
/// applied in order. Fails with [Error::Closed] if the engine has stopped.
#[derive(Clone)]
pub struct Mailbox<C> {
    sender: mpsc::Sender<Message<C>>,
}

impl<C> Mailbox<C> {
    pub(super) fn new(sender: mpsc::Sender<Message<C>>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &mut self,
        message: impl FnOnce(oneshot::Sender<T>) -> Message<C>,
    ) -> Result<T, Error> {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(message(sender))
            .await
            .map_err(|_| Error::Closed)?;
        receiver.await.map_err(|_| Error::Cancelled)
    }

    /// Apply the accept policy to `connection`.
    pub async fn connected(&mut self, connection: C) -> Result<Admission, Error> {
        self.request(|responder| Message::Connected {
            connection,
            responder,
        })
        .await?
    }

    /// Deliver client data for connection `id`.
    pub async fn data(&mut self, id: Id, data: impl Into<Bytes>) -> Result<(), Error> {
        let data = data.into();
        self.request(|responder| Message::Data {
            id,
            data,
            responder,
        })
        .await?
    }

    /// Deliver an acknowledgement of `len` bytes for connection `id`.
    pub async fn acked(&mut self, id: Id, len: usize) -> Result<(), Error> {
        self.request(|responder| Message::Acked { id, len, responder })
            .await?
    }

    /// Deliver a periodic tick for connection `id`.
    pub async fn poll(&mut self, id: Id) -> Result<(), Error> {
        self.request(|responder| Message::Poll { id, responder })
            .await?
    }

    /// Report that connection `id` went away.
    pub async fn disconnected(&mut self, id: Id) -> Result<(), Error> {
        self.request(|responder| Message::Disconnected { id, responder })
            .await?
    }

    /// Replace the admission limits.
    pub async fn set_limits(&mut self, limits: Limits) -> Result<(), Error> {
        self.request(|responder| Message::SetLimits { limits, responder })
            .await
    }

    pub async fn queue_length(&mut self) -> Result<usize, Error> {
        self.request(|responder| Message::QueueLength { responder })
            .await
    }

    pub async fn clients(&mut self) -> Result<usize, Error> {
        self.request(|responder| Message::Clients { responder })
            .await
    }

    pub async fn active_count(&mut self) -> Result<usize, Error> {
        self.request(|responder| Message::ActiveCount { responder })
            .await
    }

    pub async fn status(&mut self) -> Result<Status, Error> {
        self.request(|responder| Message::Status { responder })
            .await
    }

    pub async fn render(&mut self) -> Result<String, Error> {
        self.request(|responder| Message::Render { responder })
            .await
    }
}
