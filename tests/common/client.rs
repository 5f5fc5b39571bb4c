//! Raw line client for integration tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test client speaking newline-terminated text.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    local_addr: SocketAddr,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let local_addr = stream.local_addr()?;

        // Split stream for reading and writing
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            local_addr,
        })
    }

    /// How the server names this client in notices.
    pub fn peer(&self) -> String {
        self.local_addr.to_string()
    }

    /// Send one line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line; `None` when the server closed the connection.
    pub async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Receive lines until the predicate matches, returning the matching line.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            match self.recv().await? {
                Some(line) if predicate(&line) => return Ok(line),
                Some(_) => continue,
                None => anyhow::bail!("connection closed before expected line"),
            }
        }
    }

    /// Read until the server closes the connection.
    ///
    /// A reset counts as closed too: the server may close with our own
    /// data still unread.
    pub async fn expect_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            match self.recv_timeout(left).await {
                Ok(None) => return Ok(()),
                Ok(Some(_)) => continue,
                Err(e) => match e.downcast_ref::<std::io::Error>() {
                    Some(_) => return Ok(()),
                    None => return Err(e),
                },
            }
        }
    }

    /// Close our end of the connection.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
