//! Server - composes the gateway, the hub and the two shutdown phases.
//!
//! ```text
//! NotStarted ──start──▶ Running ──shutdown──▶ Stopping ──▶ Stopped
//! ```
//!
//! Shutdown is an ordered sequence of signal-and-join steps:
//! 1. close the listener,
//! 2. stop and join the accept loop and every connection,
//! 3. stop and join the hub.
//!
//! The hub must outlive every connection, because connections publish their
//! departure notices and leaving events on their way out.

use crate::config::{Config, LimitsConfig};
use crate::error::ServerError;
use crate::hub::{Hub, HubHandle};
use crate::lifecycle::Stopper;
use crate::network::Gateway;
use std::future::Future;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle state of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

/// Running components, present between start and shutdown.
struct Running {
    local_addr: SocketAddr,
    hub: HubHandle,
    listener_close: CancellationToken,
}

/// The chat server.
pub struct Server {
    listen: SocketAddr,
    limits: LimitsConfig,
    state: ServerState,
    /// Phase 1: accept loop and connections.
    connections: Stopper,
    /// Phase 2: the hub.
    hub: Stopper,
    running: Option<Running>,
}

impl Server {
    pub fn new(config: &Config) -> Self {
        Self {
            listen: config.server.listen,
            limits: config.limits.clone(),
            state: ServerState::NotStarted,
            connections: Stopper::new(),
            hub: Stopper::new(),
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Handle to the hub while running, e.g. for server-side announcements.
    pub fn hub(&self) -> Option<&HubHandle> {
        self.running.as_ref().map(|r| &r.hub)
    }

    /// Number of clients currently registered with the hub.
    pub fn clients(&self) -> usize {
        self.running.as_ref().map_or(0, |r| r.hub.clients())
    }

    /// Bind the listener and launch the hub and the accept loop.
    ///
    /// Nothing is spawned if binding fails.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.state != ServerState::NotStarted {
            return Err(ServerError::AlreadyStarted);
        }

        let gateway = Gateway::bind(self.listen, self.limits.clone()).await?;
        let local_addr = gateway.local_addr();

        let hub = Hub::spawn(&self.limits, &self.hub);
        let listener_close = CancellationToken::new();
        self.connections.spawn(gateway.run(
            hub.clone(),
            self.connections.clone(),
            listener_close.clone(),
        ));

        self.running = Some(Running {
            local_addr,
            hub,
            listener_close,
        });
        self.state = ServerState::Running;
        info!(%local_addr, "Server started");
        Ok(local_addr)
    }

    /// Two-phase graceful shutdown. A no-op unless the server is running.
    pub async fn shutdown(&mut self) {
        if self.state != ServerState::Running {
            debug!(state = ?self.state, "Shutdown ignored");
            return;
        }
        self.state = ServerState::Stopping;
        let Some(running) = self.running.take() else {
            self.state = ServerState::Stopped;
            return;
        };
        info!(clients = running.hub.clients(), "Shutting down");

        running.listener_close.cancel();
        self.connections.stop().await;
        debug!("Connections stopped");
        self.hub.stop().await;

        self.state = ServerState::Stopped;
        info!("Server stopped");
    }

    /// Start, wait for `signal`, then shut down.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        signal.await;
        self.shutdown().await;
        Ok(())
    }
}
