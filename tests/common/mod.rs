//! Integration test common infrastructure.
//!
//! Provides utilities for running test servers, creating raw line clients,
//! and asserting on relayed line flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::{TestProcess, TestServer};
