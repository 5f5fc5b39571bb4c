//! Client identity and outbound queues as seen by the hub.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// A line of text travelling through the hub. Cheap to clone for fan-out.
pub type Line = Arc<str>;

/// Process-unique identity of one connected peer.
///
/// Two connections from the same address still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Sequential [`ClientId`] allocator, shared by the acceptor.
#[derive(Debug, Clone, Default)]
pub struct ClientIdGen {
    next: Arc<AtomicU64>,
}

impl ClientIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> ClientId {
        ClientId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Write-only handle to a client's bounded outbound queue.
///
/// This is handed to the hub in the entering event and is the only sending
/// endpoint of the queue, so the queue closes when the hub drops it.
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    tx: mpsc::Sender<Line>,
}

impl ClientHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<Line>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub(crate) fn into_sender(self) -> mpsc::Sender<Line> {
        self.tx
    }
}
