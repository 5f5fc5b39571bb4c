//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-connection handler and the
//! wire notices the server emits.

mod connection;
mod gateway;
pub mod notice;

pub use connection::Connection;
pub use gateway::Gateway;
