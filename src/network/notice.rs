//! Server-originated lines.
//!
//! `peer` is the remote `ip:port` of the connection the notice is about.

pub fn entering(peer: &str) -> String {
    format!("[{peer}] is entering.")
}

pub fn said(peer: &str, text: &str) -> String {
    format!("[{peer}]: {text}")
}

/// Departure because the server is shutting down.
pub fn leaving(peer: &str) -> String {
    format!("[{peer}] is leaving.")
}

/// Departure because the connection failed or the peer hung up.
pub fn has_left(peer: &str) -> String {
    format!("[{peer}] has left.")
}
