//! Tracing setup and span constructors.

use crate::config::LogConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter. With `log.file` set, output
/// goes to that file (appended, no colours) instead of stderr.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match &config.file {
        None if config.json => builder.json().try_init(),
        None => builder.try_init(),
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            if config.json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Standardized span constructors.
pub mod spans {
    use crate::hub::ClientId;
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Create a span for an accepted connection.
    pub fn connection(client: ClientId, addr: &SocketAddr) -> Span {
        info_span!("connection", client = %client, addr = %addr)
    }

    /// Create a span for an outbound client session.
    pub fn session(server: &str) -> Span {
        info_span!("session", server = %server)
    }
}

