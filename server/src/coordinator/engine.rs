use super::{Config, Mailbox, Message};
use crate::{Controller, Service};
use commonware_macros::select;
use commonware_runtime::{Handle, Metrics, Spawner};
use frugal_buffer::Heap;
use futures::{channel::mpsc, StreamExt};
use tracing::{debug, trace, warn};

/// Instance of the main engine for the module.
///
/// It owns the [Controller] and applies events from the [Mailbox] one at a time.
pub struct Engine<E: Spawner + Metrics, S: Service, H: Heap> {
    ////////////////////////////////////////
    // Interfaces
    ////////////////////////////////////////
    context: E,

    ////////////////////////////////////////
    // State
    ////////////////////////////////////////
    /// Request queue and admission policy.
    controller: Controller<S, H>,

    ////////////////////////////////////////
    // Messaging
    ////////////////////////////////////////
    /// The mailbox for receiving messages.
    mailbox_receiver: mpsc::Receiver<Message<S::Connection>>,
}

impl<E: Spawner + Metrics, S: Service, H: Heap> Engine<E, S, H> {
    /// Creates a new engine with the given context and configuration.
    /// Returns the engine and a mailbox for sending messages to the engine.
    pub fn new(context: E, cfg: Config<S, H>) -> (Self, Mailbox<S::Connection>) {
        let (mailbox_sender, mailbox_receiver) = mpsc::channel(cfg.mailbox_size);
        let mailbox = Mailbox::new(mailbox_sender);
        let controller = Controller::new(context.with_label("controller"), cfg.controller);

        let result = Self {
            context,
            controller,
            mailbox_receiver,
        };

        (result, mailbox)
    }

    /// Starts the engine.
    pub fn start(self) -> Handle<()> {
        let context = self.context.clone();
        context.spawn(|_| self.run())
    }

    /// Inner run loop called by `start`.
    async fn run(mut self) {
        let mut shutdown = self.context.stopped();
        loop {
            select! {
                // Handle shutdown signal
                _ = &mut shutdown => {
                    debug!("shutdown");
                    break;
                },

                // Handle mailbox messages
                mail = self.mailbox_receiver.next() => {
                    let Some(msg) = mail else {
                        debug!("mailbox closed");
                        break;
                    };
                    self.handle(msg);
                },
            }
        }
    }

    fn handle(&mut self, msg: Message<S::Connection>) {
        match msg {
            Message::Connected {
                connection,
                responder,
            } => {
                trace!("mailbox: connected");
                let _ = responder.send(self.controller.connected(connection));
            }
            Message::Data {
                id,
                data,
                responder,
            } => {
                trace!(id, len = data.len(), "mailbox: data");
                let _ = responder.send(self.controller.data(id, &data));
            }
            Message::Acked { id, len, responder } => {
                trace!(id, len, "mailbox: acked");
                let _ = responder.send(self.controller.acked(id, len));
            }
            Message::Poll { id, responder } => {
                let _ = responder.send(self.controller.poll(id));
            }
            Message::Disconnected { id, responder } => {
                trace!(id, "mailbox: disconnected");
                let _ = responder.send(self.controller.disconnected(id));
            }
            Message::SetLimits { limits, responder } => {
                self.controller.set_limits(limits);
                let _ = responder.send(());
            }
            Message::QueueLength { responder } => {
                let _ = responder.send(self.controller.queue_length());
            }
            Message::Clients { responder } => {
                let _ = responder.send(self.controller.clients());
            }
            Message::ActiveCount { responder } => {
                let _ = responder.send(self.controller.active_count());
            }
            Message::Status { responder } => {
                let _ = responder.send(self.controller.status());
            }
            Message::Render { responder } => {
                let mut out = String::new();
                if self.controller.render(&mut out).is_err() {
                    warn!("failed to render status");
                }
                let _ = responder.send(out);
            }
        }
    }
}
