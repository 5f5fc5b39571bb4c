//! Broadcast hub: the single owner of the client registry.
//!
//! # Architecture
//!
//! - **State Ownership**: The [`Hub`] task owns the registry. Nothing else reads
//!   or writes it, so it needs no lock.
//! - **Message Passing**: Connections reach the hub through a [`HubHandle`],
//!   which feeds three bounded event channels (entering, leaving, messages).
//! - **Backpressure**: Fan-out never blocks the loop. A full client queue gets
//!   an async delivery worker gated by a per-client [`Stopper`].
//!
//! Events on one channel are handled in order; there is no ordering across
//! channels, and none between fallback deliveries to the same client.

mod client;
mod handle;

pub use client::{ClientHandle, ClientId, ClientIdGen, Line};
pub use handle::HubHandle;

use handle::Entering;

use crate::config::LimitsConfig;
use crate::lifecycle::Stopper;
use std::collections::HashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Registry entry for one client.
struct Registered {
    tx: mpsc::Sender<Line>,
    /// Present once a delivery to this client had to go async.
    slow: Option<Stopper>,
}

impl Registered {
    /// Hand `line` to a background worker that waits for queue space.
    fn deliver_later(&mut self, id: ClientId, line: Line) {
        let slow = self.slow.get_or_insert_with(|| {
            debug!(client = %id, "Outbound queue full, delivering asynchronously");
            Stopper::new()
        });
        let tx = self.tx.clone();
        let stop = slow.token();
        slow.spawn(async move {
            tokio::select! {
                res = tx.send(line) => {
                    if res.is_err() {
                        trace!(client = %id, "Queue dropped before delayed delivery");
                    }
                }
                _ = stop.cancelled() => {}
            }
        });
    }

    /// Join outstanding delivery workers, then close the queue.
    async fn close(mut self) {
        if let Some(slow) = self.slow.take() {
            slow.stop().await;
        }
        // Dropping the hub's sender is what closes the queue.
        drop(self.tx);
    }
}

/// The hub event loop.
pub struct Hub {
    entering: mpsc::Receiver<Entering>,
    leaving: mpsc::Receiver<ClientId>,
    messages: mpsc::Receiver<Line>,
    clients: HashMap<ClientId, Registered>,
    size: watch::Sender<usize>,
}

impl Hub {
    /// Create a hub and the handle used to reach it. The hub does nothing
    /// until [`Hub::run`] is polled.
    pub fn new(limits: &LimitsConfig) -> (Self, HubHandle) {
        let (entering_tx, entering) = mpsc::channel(limits.entering_queue);
        let (leaving_tx, leaving) = mpsc::channel(limits.leaving_queue);
        let (messages_tx, messages) = mpsc::channel(limits.message_queue);
        let (size, size_rx) = watch::channel(0);

        let hub = Self {
            entering,
            leaving,
            messages,
            clients: HashMap::new(),
            size,
        };
        let handle = HubHandle::new(entering_tx, leaving_tx, messages_tx, size_rx);
        (hub, handle)
    }

    /// Create a hub and run it as a worker of `stopper`.
    ///
    /// The hub exits only when `stopper` is stopped.
    pub fn spawn(limits: &LimitsConfig, stopper: &Stopper) -> HubHandle {
        let (hub, handle) = Self::new(limits);
        stopper.spawn(hub.run(stopper.token()));
        handle
    }

    /// The main hub loop.
    pub async fn run(mut self, stop: CancellationToken) {
        debug!("Hub started");
        loop {
            tokio::select! {
                Some(event) = self.entering.recv() => self.handle_entering(event),
                Some(line) = self.messages.recv() => self.handle_message(line),
                Some(id) = self.leaving.recv() => self.handle_leaving(id).await,
                _ = stop.cancelled() => {
                    self.teardown().await;
                    break;
                }
            }
        }
    }

    fn handle_entering(&mut self, Entering { client, ack }: Entering) {
        let id = client.id();
        if self.clients.contains_key(&id) {
            warn!(client = %id, "Duplicate entering event ignored");
        } else {
            self.clients.insert(
                id,
                Registered {
                    tx: client.into_sender(),
                    slow: None,
                },
            );
            self.publish_size();
            debug!(client = %id, clients = self.clients.len(), "Client registered");
        }
        // The caller may have given up waiting.
        let _ = ack.send(());
    }

    fn handle_message(&mut self, line: Line) {
        trace!(%line, recipients = self.clients.len(), "Broadcasting");
        for (id, client) in self.clients.iter_mut() {
            match client.tx.try_send(line.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(line)) => client.deliver_later(*id, line),
                Err(TrySendError::Closed(_)) => {
                    debug!(client = %id, "Outbound queue receiver gone, skipping");
                }
            }
        }
    }

    async fn handle_leaving(&mut self, id: ClientId) {
        match self.clients.remove(&id) {
            Some(client) => {
                client.close().await;
                self.publish_size();
                debug!(client = %id, clients = self.clients.len(), "Client deregistered");
            }
            None => debug!(client = %id, "Leaving event for unknown client"),
        }
    }

    async fn teardown(&mut self) {
        let clients = std::mem::take(&mut self.clients);
        let count = clients.len();
        for (_, client) in clients {
            client.close().await;
        }
        self.publish_size();
        info!(closed = count, "Hub stopped");
    }

    fn publish_size(&self) {
        self.size.send_replace(self.clients.len());
    }
}
