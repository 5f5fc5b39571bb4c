//! Unified error handling for linechat.
//!
//! Each layer gets its own error enum. Only bind failures are fatal to the
//! server; everything per-connection is logged and turned into a departure.

use std::net::SocketAddr;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

// ============================================================================
// Server Errors (lifecycle)
// ============================================================================

/// Errors surfaced by [`crate::Server`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server already started")]
    AlreadyStarted,
}

impl ServerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind",
            Self::AlreadyStarted => "already_started",
        }
    }
}

// ============================================================================
// Hub Errors (event delivery)
// ============================================================================

/// The hub task has stopped and no longer consumes events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("hub is no longer accepting events")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for HubError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

// ============================================================================
// Client Errors (outbound connection)
// ============================================================================

/// Errors from the outbound [`crate::ChatClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,

    #[error("already connected to {0}")]
    AlreadyConnected(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_server_error_codes() {
        let bind = ServerError::Bind {
            addr: "127.0.0.1:1".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert_eq!(bind.error_code(), "bind");
        assert_eq!(ServerError::AlreadyStarted.error_code(), "already_started");
    }

    #[test]
    fn test_bind_error_names_address() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:4321".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("127.0.0.1:4321"));
    }

    #[test]
    fn test_send_error_maps_to_closed() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        drop(rx);
        let err = tx.try_send(1).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(v) => mpsc::error::SendError(v),
            mpsc::error::TrySendError::Full(v) => mpsc::error::SendError(v),
        });
        assert_eq!(HubError::from(err.unwrap_err()), HubError::Closed);
    }
}
