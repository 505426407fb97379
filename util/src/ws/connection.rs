//! One live participant: identity plus a bounded outbound queue.
//!
//! The queue's receiving half is owned by the connection's write loop. The
//! sending half lives here so that closing it (on unregister) is observable by
//! the write loop as end-of-stream.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::identity::{Identity, Role};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for a connection. The same user may hold several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn_{}", self.0)
    }
}

/// Result of pushing onto a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue at capacity; the event was dropped for this connection.
    Dropped,
    /// Queue already closed by unregister or shutdown.
    Closed,
}

/// Outbound queue receiver handed to the write loop.
pub type Outbound<M> = mpsc::Receiver<Arc<M>>;

pub struct Connection<M> {
    id: ConnectionId,
    identity: Identity,
    tx: Mutex<Option<mpsc::Sender<Arc<M>>>>,
    connected_at: DateTime<Utc>,
    dropped: AtomicU64,
}

impl<M> Connection<M> {
    /// Creates a connection and the receiving half of its outbound queue.
    pub fn new(identity: Identity, capacity: usize) -> (Arc<Self>, Outbound<M>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::next(),
            identity,
            tx: Mutex::new(Some(tx)),
            connected_at: Utc::now(),
            dropped: AtomicU64::new(0),
        };
        (Arc::new(conn), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Pushes an event without waiting. A full queue drops the event and
    /// bumps the drop counter; callers decide whether to log.
    pub fn send(&self, message: Arc<M>) -> Delivery {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Delivery::Closed;
        };
        match tx.try_send(message) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Closes the outbound queue. Already-queued events are still drained by
    /// the write loop. Returns `false` if the queue was already closed.
    pub fn close(&self) -> bool {
        self.tx.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Events dropped because the queue was full.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M> fmt::Debug for Connection<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("closed", &self.is_closed())
            .finish()
    }
}
