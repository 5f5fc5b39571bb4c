//! linechat - line-oriented multi-client chat relay.
//!
//! Every line a client sends is fanned out to all connected clients,
//! interleaved with entry and exit notices. All registry state lives in a
//! single hub task; everything else talks to it over channels.

pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod lifecycle;
pub mod network;
pub mod server;
pub mod telemetry;

pub use client::ChatClient;
pub use config::Config;
pub use error::{ClientError, HubError, ServerError};
pub use hub::{ClientHandle, ClientId, Hub, HubHandle, Line};
pub use lifecycle::Stopper;
pub use server::{Server, ServerState};
