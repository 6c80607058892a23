//! Connection registry for tracking all connected clients

use super::connection::ClientHandle;
use parking_lot::RwLock;
use pixel_commander_shared::{limits, ConnectionId, Reply};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Maps connection ids to live reply channels
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<ConnectionId, ClientHandle>>,
    next_id: AtomicU64,
    reply_backlog: usize,
}

impl ConnectionRegistry {
    /// Create an empty registry with the default per-client reply backlog
    pub fn new() -> Self {
        Self::with_reply_backlog(limits::DEFAULT_REPLY_BACKLOG)
    }

    /// Create an empty registry whose clients may each hold `reply_backlog`
    /// undelivered replies before being evicted
    pub fn with_reply_backlog(reply_backlog: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            reply_backlog,
        }
    }

    /// Allocate an id for a new client and register it
    pub fn open(&self, addr: SocketAddr) -> (ClientHandle, mpsc::Receiver<Reply>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (handle, rx) = ClientHandle::new(id, addr, self.reply_backlog);
        self.register(handle.clone());
        (handle, rx)
    }

    /// Register a client handle under its id
    pub fn register(&self, handle: ClientHandle) {
        self.sessions.write().insert(handle.id, handle);
    }

    /// Remove a client
    pub fn unregister(&self, id: ConnectionId) -> Option<ClientHandle> {
        self.sessions.write().remove(&id)
    }

    /// Look up a live client; closed or unknown connections are `None`
    pub fn get(&self, id: ConnectionId) -> Option<ClientHandle> {
        self.sessions
            .read()
            .get(&id)
            .filter(|handle| handle.is_open())
            .cloned()
    }

    /// Send a reply to a client, returning false if it is gone
    pub fn send_to(&self, id: ConnectionId, reply: Reply) -> bool {
        self.get(id)
            .map(|handle| handle.send(reply).is_ok())
            .unwrap_or(false)
    }

    /// Remove clients that closed or were evicted and return their ids
    pub fn prune_closed(&self) -> Vec<ConnectionId> {
        let mut sessions = self.sessions.write();
        let closed: Vec<ConnectionId> = sessions
            .iter()
            .filter(|(_, handle)| !handle.is_open())
            .map(|(id, _)| *id)
            .collect();

        for id in &closed {
            sessions.remove(id);
        }
        closed
    }

    /// Number of registered clients
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
