//! Outbound chat client.
//!
//! Dials a server, sends lines, and hands every received line to a
//! callback from a background reader task.

use crate::error::ClientError;
use crate::telemetry::spans;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

/// Callback invoked for every line received from the server.
pub type LineCallback = Arc<dyn Fn(String) + Send + Sync>;

/// An open connection.
struct Session {
    local_addr: SocketAddr,
    writer: FramedWrite<OwnedWriteHalf, LinesCodec>,
    stop: CancellationToken,
    reader: JoinHandle<()>,
}

/// A chat client for one server address.
pub struct ChatClient {
    server: String,
    on_line: Option<LineCallback>,
    session: Option<Session>,
}

impl ChatClient {
    /// Create a client for `server` (`host:port`). Nothing is dialed yet.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            on_line: None,
            session: None,
        }
    }

    /// Set the callback for received lines. Without one, received lines
    /// are read and discarded.
    pub fn on_line<F>(mut self, callback: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_line = Some(Arc::new(callback));
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Our side of the connection, as the server names us in notices.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().map(|s| s.local_addr)
    }

    /// Connect to the server and start the reader.
    pub async fn enter(&mut self) -> Result<(), ClientError> {
        if self.session.is_some() {
            return Err(ClientError::AlreadyConnected(self.server.clone()));
        }

        let stream = TcpStream::connect(&self.server)
            .await
            .map_err(|source| ClientError::Connect {
                addr: self.server.clone(),
                source,
            })?;
        let local_addr = stream.local_addr()?;
        let (read_half, write_half) = stream.into_split();

        let stop = CancellationToken::new();
        let reader = tokio::spawn(
            read_lines(
                FramedRead::new(read_half, LinesCodec::new()),
                self.on_line.clone(),
                stop.clone(),
            )
            .instrument(spans::session(&self.server)),
        );

        info!(server = %self.server, %local_addr, "Entered server");
        self.session = Some(Session {
            local_addr,
            writer: FramedWrite::new(write_half, LinesCodec::new()),
            stop,
            reader,
        });
        Ok(())
    }

    /// Send one line of text.
    pub async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        let session = self.session.as_mut().ok_or(ClientError::NotConnected)?;
        session.writer.send(text).await?;
        Ok(())
    }

    /// Close the connection and wait for the reader to finish.
    pub async fn leave(&mut self) -> Result<(), ClientError> {
        let mut session = self.session.take().ok_or(ClientError::NotConnected)?;
        session.stop.cancel();
        let closed = SinkExt::<&str>::close(&mut session.writer).await;
        if let Err(e) = session.reader.await {
            warn!(error = %e, "Client reader task failed");
        }
        info!(server = %self.server, "Left server");
        closed?;
        Ok(())
    }
}

async fn read_lines(
    mut lines: FramedRead<OwnedReadHalf, LinesCodec>,
    on_line: Option<LineCallback>,
    stop: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = stop.cancelled() => break,
            frame = lines.next() => frame,
        };
        match frame {
            Some(Ok(line)) => {
                if let Some(callback) = &on_line {
                    callback(line);
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "Read error");
                break;
            }
            None => {
                debug!("Server closed the connection");
                break;
            }
        }
    }
}
