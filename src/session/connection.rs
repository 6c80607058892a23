//! Individual client connection handling

use pixel_commander_shared::{ConnectionId, Reply};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};

/// Why a reply could not be queued for a client
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("Connection {0} is closed")]
    Closed(ConnectionId),

    #[error("Connection {0} is not reading its replies")]
    Lagging(ConnectionId),
}

/// Set once a client's reply backlog overflows
#[derive(Debug, Default)]
struct Eviction {
    evicted: AtomicBool,
    notify: Notify,
}

/// Handle to send replies to a specific client
///
/// Replies go through a bounded channel drained by the connection's writer
/// task. Sending never waits: a full backlog evicts the client instead.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    outbound: mpsc::Sender<Reply>,
    eviction: Arc<Eviction>,
}

impl ClientHandle {
    /// Create a handle holding at most `backlog` undelivered replies, and
    /// the receiver its writer task drains
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        backlog: usize,
    ) -> (Self, mpsc::Receiver<Reply>) {
        let (outbound, rx) = mpsc::channel(backlog.max(1));
        let handle = Self {
            id,
            addr,
            connected_at: Instant::now(),
            outbound,
            eviction: Arc::new(Eviction::default()),
        };
        (handle, rx)
    }

    /// Queue a reply for this client
    ///
    /// On a full backlog the reply is dropped and the client is evicted;
    /// every later send fails too.
    pub fn send(&self, reply: Reply) -> Result<(), SendError> {
        if self.is_evicted() {
            return Err(SendError::Lagging(self.id));
        }

        match self.outbound.try_send(reply) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::Closed(self.id)),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.eviction.evicted.store(true, Ordering::Release);
                self.eviction.notify.notify_one();
                Err(SendError::Lagging(self.id))
            }
        }
    }

    /// Check if the client can still take replies
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed() && !self.is_evicted()
    }

    pub fn is_evicted(&self) -> bool {
        self.eviction.evicted.load(Ordering::Acquire)
    }

    /// Wait until the client is evicted for not reading its replies
    pub async fn evicted(&self) {
        if self.is_evicted() {
            return;
        }
        // notify_one keeps a permit, so an eviction racing this call still wakes it
        self.eviction.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_send_reaches_receiver() {
        let (handle, mut rx) = ClientHandle::new(ConnectionId(1), addr(), 4);
        handle.send(Reply::Ack(5)).unwrap();
        assert_eq!(rx.recv().await, Some(Reply::Ack(5)));
        assert!(handle.is_open());
    }

    #[test]
    fn test_send_after_close() {
        let (handle, rx) = ClientHandle::new(ConnectionId(2), addr(), 4);
        drop(rx);
        assert!(!handle.is_open());
        assert_eq!(handle.send(Reply::Pong), Err(SendError::Closed(ConnectionId(2))));
    }

    #[tokio::test]
    async fn test_full_backlog_evicts_client() {
        let (handle, mut rx) = ClientHandle::new(ConnectionId(3), addr(), 3);
        for id in 1..=3 {
            handle.send(Reply::Ack(id)).unwrap();
        }

        assert_eq!(handle.send(Reply::Ack(4)), Err(SendError::Lagging(ConnectionId(3))));
        assert!(handle.is_evicted());
        assert!(!handle.is_open());

        // Draining does not readmit the client
        assert_eq!(rx.recv().await, Some(Reply::Ack(1)));
        assert_eq!(handle.send(Reply::Ack(5)), Err(SendError::Lagging(ConnectionId(3))));

        // Nothing past the backlog was queued
        assert_eq!(rx.try_recv().ok(), Some(Reply::Ack(2)));
        assert_eq!(rx.try_recv().ok(), Some(Reply::Ack(3)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_eviction_wakes_waiter() {
        let (handle, _rx) = ClientHandle::new(ConnectionId(4), addr(), 1);
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.evicted().await });

        handle.send(Reply::Pong).unwrap();
        let _ = handle.send(Reply::Pong);

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("eviction not signalled")
            .unwrap();
    }

    #[tokio::test]
    async fn test_eviction_before_wait_returns_immediately() {
        let (handle, _rx) = ClientHandle::new(ConnectionId(5), addr(), 1);
        handle.send(Reply::Pong).unwrap();
        let _ = handle.send(Reply::Pong);

        tokio::time::timeout(Duration::from_secs(1), handle.evicted())
            .await
            .expect("eviction not observed");
    }
}
