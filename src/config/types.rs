//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Queue capacities and line limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Logging output.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: "0.0.0.0:4321"). Port 0 picks a free port.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Queue capacities and line limits.
///
/// The event queues feed the hub; `client_queue` bounds each client's
/// outbound backlog before the hub falls back to async delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Per-client outbound queue capacity (default: 100).
    #[serde(default = "default_client_queue")]
    pub client_queue: usize,
    /// Entering event queue capacity (default: 10).
    #[serde(default = "default_entering_queue")]
    pub entering_queue: usize,
    /// Leaving event queue capacity (default: 1).
    #[serde(default = "default_leaving_queue")]
    pub leaving_queue: usize,
    /// Broadcast message queue capacity (default: 1024).
    #[serde(default = "default_message_queue")]
    pub message_queue: usize,
    /// Longest accepted input line in bytes (default: 65536).
    /// A longer line ends the sender's connection.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            client_queue: default_client_queue(),
            entering_queue: default_entering_queue(),
            leaving_queue: default_leaving_queue(),
            message_queue: default_message_queue(),
            max_line_length: default_max_line_length(),
        }
    }
}

/// Logging configuration.
///
/// `RUST_LOG` takes precedence over `filter` when set.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default filter directive (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
            json: false,
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 4321))
}

fn default_client_queue() -> usize {
    100
}

fn default_entering_queue() -> usize {
    10
}

fn default_leaving_queue() -> usize {
    1
}

fn default_message_queue() -> usize {
    1024
}

fn default_max_line_length() -> usize {
    64 * 1024
}

fn default_log_filter() -> String {
    "info".to_string()
}
