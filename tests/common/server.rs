//! Test server management.
//!
//! [`TestServer`] runs a server inside the test's runtime; [`TestProcess`]
//! spawns the `linechat` binary for end-to-end checks.

use linechat::{Config, HubHandle, Server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// An in-process test server.
pub struct TestServer {
    server: Server,
    addr: SocketAddr,
    hub: HubHandle,
}

#[allow(dead_code)]
impl TestServer {
    /// Start a server on a free local port with default limits.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(Config::default()).await
    }

    /// Start a server with the given configuration, on a free local port.
    pub async fn spawn_with(mut config: Config) -> anyhow::Result<Self> {
        config.server.listen = "127.0.0.1:0".parse()?;
        let mut server = Server::new(&config);
        let addr = server.start().await?;
        let hub = server
            .hub()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("server has no hub after start"))?;
        Ok(Self { server, addr, hub })
    }

    /// Get the server address.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// The hub handle; stays readable after shutdown.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Connect a client and wait until the hub has registered it.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        let expected = self.hub.clients() + 1;
        let client = super::client::TestClient::connect(self.addr).await?;
        self.wait_for_clients(expected).await?;
        Ok(client)
    }

    /// Wait until exactly `count` clients are registered.
    pub async fn wait_for_clients(&self, count: usize) -> anyhow::Result<()> {
        timeout(Duration::from_secs(5), self.hub.wait_for_clients(count)).await??;
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        self.server.shutdown().await;
    }

    pub fn server(&self) -> &Server {
        &self.server
    }
}

/// A `linechat serve` child process.
pub struct TestProcess {
    child: Child,
    addr: SocketAddr,
    data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestProcess {
    /// Spawn `linechat serve` with `config_toml` written to a temp file.
    pub async fn spawn(config_toml: &str) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?.keep();
        let config_path = data_dir.join("linechat.toml");
        std::fs::write(&config_path, config_toml)?;

        let addr = free_local_addr()?;
        let child = Command::new(env!("CARGO_BIN_EXE_linechat"))
            .arg("serve")
            .arg("--config")
            .arg(&config_path)
            .arg("--listen")
            .arg(addr.to_string())
            .arg("--log")
            .arg(data_dir.join("linechat.log"))
            .spawn()?;

        let process = Self {
            child,
            addr,
            data_dir,
        };
        process.wait_until_ready().await?;
        Ok(process)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(self.addr).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("linechat.log")
    }
}

impl Drop for TestProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Reserve a free port, then release it for the child to bind.
pub fn free_local_addr() -> anyhow::Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?)
}
