//! Sending side of the hub.

use super::{ClientHandle, ClientId, Line};
use crate::error::HubError;
use tokio::sync::{mpsc, oneshot, watch};

/// An entering event plus the reply sent once the client is registered.
#[derive(Debug)]
pub(super) struct Entering {
    pub(super) client: ClientHandle,
    pub(super) ack: oneshot::Sender<()>,
}

/// Cloneable handle for publishing events to the [`super::Hub`].
///
/// Each event kind has its own channel; order is only kept per channel.
/// Entering is acknowledged, so a client's leaving event always follows
/// its registration.
#[derive(Debug, Clone)]
pub struct HubHandle {
    entering: mpsc::Sender<Entering>,
    leaving: mpsc::Sender<ClientId>,
    messages: mpsc::Sender<Line>,
    size: watch::Receiver<usize>,
}

impl HubHandle {
    pub(super) fn new(
        entering: mpsc::Sender<Entering>,
        leaving: mpsc::Sender<ClientId>,
        messages: mpsc::Sender<Line>,
        size: watch::Receiver<usize>,
    ) -> Self {
        Self {
            entering,
            leaving,
            messages,
            size,
        }
    }

    /// Register a client and wait until the hub has recorded it.
    ///
    /// Must be called at most once per client, and before [`Self::leave`].
    pub async fn enter(&self, client: ClientHandle) -> Result<(), HubError> {
        let (ack, registered) = oneshot::channel();
        self.entering.send(Entering { client, ack }).await?;
        registered.await.map_err(|_| HubError::Closed)
    }

    /// Deregister a client; the hub closes its queue afterwards.
    pub async fn leave(&self, id: ClientId) -> Result<(), HubError> {
        self.leaving.send(id).await?;
        Ok(())
    }

    /// Fan a line out to every registered client.
    pub async fn broadcast(&self, line: impl Into<Line>) -> Result<(), HubError> {
        self.messages.send(line.into()).await?;
        Ok(())
    }

    /// Number of registered clients as last published by the hub.
    pub fn clients(&self) -> usize {
        *self.size.borrow()
    }

    /// Wait until the hub reports exactly `count` registered clients.
    pub async fn wait_for_clients(&self, count: usize) -> Result<(), HubError> {
        let mut size = self.size.clone();
        size.wait_for(|n| *n == count)
            .await
            .map(|_| ())
            .map_err(|_| HubError::Closed)
    }
}
