//! Connection - Handles an individual client connection.
//!
//! Each Connection runs as a worker of the server's connection stopper and
//! splits the socket between two activities:
//!
//! ```text
//!   socket read half ──▶ [reader task] ──"[peer]: line"──▶ hub messages
//!                             │ finished
//!                             ▼
//!   hub ──▶ outbound queue ──▶ [writer loop] ──▶ socket write half
//!                             ▲
//!                      server stop signal
//! ```
//!
//! The writer loop owns the lifecycle: it announces the client, and once any
//! of its three sources ends the session it deregisters the client, joins the
//! reader and closes the socket, in that order.

use super::notice;
use crate::config::LimitsConfig;
use crate::hub::{ClientHandle, ClientId, HubHandle, Line};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

/// Why the writer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The server is shutting down.
    Stopped,
    /// The reader hit EOF or an error.
    ReadFailed,
    /// Writing to the socket failed.
    WriteFailed,
    /// The hub closed the outbound queue.
    QueueClosed,
}

impl Exit {
    fn departure(self, peer: &str) -> Option<String> {
        match self {
            Self::Stopped => Some(notice::leaving(peer)),
            Self::ReadFailed | Self::WriteFailed => Some(notice::has_left(peer)),
            Self::QueueClosed => None,
        }
    }
}

/// A client connection handler.
pub struct Connection {
    id: ClientId,
    addr: SocketAddr,
    stream: TcpStream,
    hub: HubHandle,
    stop: CancellationToken,
    queue_capacity: usize,
    max_line_length: usize,
}

impl Connection {
    /// Create a new connection handler. `stop` is the server-wide
    /// connection stop signal.
    pub fn new(
        id: ClientId,
        stream: TcpStream,
        addr: SocketAddr,
        hub: HubHandle,
        stop: CancellationToken,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            id,
            addr,
            stream,
            hub,
            stop,
            queue_capacity: limits.client_queue,
            max_line_length: limits.max_line_length,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Run the connection until the peer goes away or the server stops.
    pub async fn run(self) {
        let Self {
            id,
            addr,
            stream,
            hub,
            stop,
            queue_capacity,
            max_line_length,
        } = self;
        let peer = addr.to_string();
        info!("Client connected");

        let (handle, mut outbound) = ClientHandle::new(id, queue_capacity);
        if hub.enter(handle).await.is_err() {
            warn!("Hub unavailable, dropping connection");
            return;
        }
        if hub.broadcast(notice::entering(&peer)).await.is_err() {
            debug!("Hub closed before entering notice");
        }

        let (read_half, write_half) = stream.into_split();
        let mut writer = FramedWrite::new(write_half, LinesCodec::new());

        // Writer -> reader: stop reading. Also fires on server stop.
        let reader_stop = stop.child_token();
        // Reader -> writer: the connection is finished.
        let finished = CancellationToken::new();
        let reader = tokio::spawn(
            read_lines(
                FramedRead::new(read_half, LinesCodec::new_with_max_length(max_line_length)),
                peer.clone(),
                hub.clone(),
                reader_stop.clone(),
                finished.clone(),
            )
            .in_current_span(),
        );

        let exit = write_lines(&mut writer, &mut outbound, &stop, &finished).await;
        debug!(?exit, "Writer loop finished");

        if let Some(departure) = exit.departure(&peer)
            && hub.broadcast(departure).await.is_err()
        {
            debug!("Hub closed before departure notice");
        }
        if hub.leave(id).await.is_err() {
            debug!("Hub closed before leaving event");
        }

        reader_stop.cancel();
        if let Err(e) = reader.await {
            warn!(error = %e, "Reader task failed");
        }

        let mut write_half = writer.into_inner();
        if let Err(e) = write_half.shutdown().await {
            debug!(error = %e, "Socket shutdown failed");
        }
        drop(write_half);
        info!("Client disconnected");
    }
}

/// Relay outbound queue lines to the socket until something ends the session.
async fn write_lines(
    writer: &mut FramedWrite<tokio::net::tcp::OwnedWriteHalf, LinesCodec>,
    outbound: &mut mpsc::Receiver<Line>,
    stop: &CancellationToken,
    finished: &CancellationToken,
) -> Exit {
    loop {
        tokio::select! {
            line = outbound.recv() => match line {
                Some(line) => {
                    // A peer that stops reading must not hold up shutdown.
                    let sent = tokio::select! {
                        sent = writer.send(line) => sent,
                        _ = stop.cancelled() => return Exit::Stopped,
                    };
                    if let Err(e) = sent {
                        warn!(error = %e, "Write error");
                        return Exit::WriteFailed;
                    }
                }
                None => return Exit::QueueClosed,
            },
            _ = stop.cancelled() => return Exit::Stopped,
            _ = finished.cancelled() => return Exit::ReadFailed,
        }
    }
}

/// Forward every inbound line to the hub.
///
/// Signals `finished` only when reading fails; a stop request just returns.
async fn read_lines(
    mut lines: FramedRead<OwnedReadHalf, LinesCodec>,
    peer: String,
    hub: HubHandle,
    stop: CancellationToken,
    finished: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = stop.cancelled() => return,
            frame = lines.next() => frame,
        };
        match frame {
            Some(Ok(line)) => {
                if hub.broadcast(notice::said(&peer, &line)).await.is_err() {
                    debug!("Hub closed, reader exiting");
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "Read error");
                break;
            }
            None => {
                debug!("Peer closed its end");
                break;
            }
        }
    }
    finished.cancel();
}
