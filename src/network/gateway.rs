//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listening socket and spawns a [`Connection`] for
//! each incoming client. Connections are spawned on the same stopper as the
//! accept loop, so stopping it joins every open connection too.

use crate::config::LimitsConfig;
use crate::error::ServerError;
use crate::hub::{ClientIdGen, HubHandle};
use crate::lifecycle::Stopper;
use crate::network::Connection;
use crate::telemetry::spans;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    local_addr: SocketAddr,
    ids: ClientIdGen,
    limits: LimitsConfig,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, limits: LimitsConfig) -> Result<Self, ServerError> {
        let bind_err = |source| ServerError::Bind { addr, source };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        info!(%local_addr, "Listener bound");

        Ok(Self {
            listener,
            local_addr,
            ids: ClientIdGen::new(),
            limits,
        })
    }

    /// The bound address (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `close` fires, `stopper` is stopped or
    /// accepting fails. The listening socket is closed on return.
    #[instrument(skip_all, fields(addr = %self.local_addr), name = "gateway")]
    pub async fn run(self, hub: HubHandle, stopper: Stopper, close: CancellationToken) {
        loop {
            if stopper.is_stopped() {
                info!("Stop requested, accept loop exiting");
                break;
            }

            let accepted = tokio::select! {
                _ = close.cancelled() => {
                    info!("Listener closed");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, addr)) => {
                    let id = self.ids.next();
                    info!(%addr, client = %id, "Connection accepted");

                    let connection = Connection::new(
                        id,
                        stream,
                        addr,
                        hub.clone(),
                        stopper.token(),
                        &self.limits,
                    );
                    stopper.spawn(connection.run().instrument(spans::connection(id, &addr)));
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    break;
                }
            }
        }
    }
}
