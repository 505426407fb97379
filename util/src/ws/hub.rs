//! Registry of live connections and the only path for fan-out.
//!
//! A single coordination task owns the connection set. Callers submit
//! register / unregister / broadcast / inspect intents over one FIFO channel
//! and the task applies them one at a time in arrival order, so the set is
//! never observed half-updated and never needs a lock.
//!
//! Arrival order is the order of effect: a connection registered after a
//! broadcast was enqueued does not receive it, and one unregistered before a
//! broadcast was enqueued does not either.
//!
//! Delivery never blocks the loop: a recipient whose queue is full loses that
//! event (see [`Connection::send`]) and a warning is logged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionId, Delivery};
use crate::identity::Role;

/// Point-in-time view of one registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub id: ConnectionId,
    pub user_id: String,
    pub role: Role,
    pub connected_at: DateTime<Utc>,
    pub dropped: u64,
}

/// Outcome of one broadcast, as seen by the coordination loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub closed: usize,
}

enum Intent<M> {
    Register(Arc<Connection<M>>),
    Unregister(Arc<Connection<M>>),
    Broadcast {
        message: Arc<M>,
        report: Option<oneshot::Sender<BroadcastReport>>,
    },
    Inspect(oneshot::Sender<Vec<ConnectionSummary>>),
}

/// Cloneable handle to the hub's coordination task.
///
/// The task stops once every handle has been dropped; at that point all
/// remaining outbound queues are closed.
pub struct Hub<M> {
    intents: mpsc::Sender<Intent<M>>,
}

impl<M> Clone for Hub<M> {
    fn clone(&self) -> Self {
        Self {
            intents: self.intents.clone(),
        }
    }
}

impl<M> fmt::Debug for Hub<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("running", &!self.intents.is_closed())
            .finish()
    }
}

impl<M> Hub<M>
where
    M: Send + Sync + 'static,
{
    /// Spawns the coordination task on the current Tokio runtime.
    pub fn spawn(channel_capacity: usize) -> Self {
        let (intents, intent_rx) = mpsc::channel(channel_capacity.max(1));

        let coordinator = Coordinator {
            connections: HashMap::new(),
            intents: intent_rx,
        };
        tokio::spawn(coordinator.run());

        Self { intents }
    }

    /// Adds a connection to the live set. Always succeeds while the hub runs.
    pub async fn register(&self, connection: Arc<Connection<M>>) {
        if self.intents.send(Intent::Register(connection)).await.is_err() {
            warn!("hub stopped; register intent discarded");
        }
    }

    /// Removes a connection and closes its outbound queue. Unknown or
    /// already-removed connections are ignored.
    pub async fn unregister(&self, connection: Arc<Connection<M>>) {
        if let Err(mpsc::error::SendError(Intent::Unregister(connection))) =
            self.intents.send(Intent::Unregister(connection)).await
        {
            connection.close();
            warn!(conn_id = %connection.id(), "hub stopped; closed queue directly");
        }
    }

    /// Queues `message` for every connection registered when the loop
    /// processes this intent.
    pub async fn broadcast(&self, message: M) {
        self.broadcast_shared(Arc::new(message), None).await;
    }

    /// Like [`Hub::broadcast`], but waits for the loop to report how many
    /// recipients the message reached.
    pub async fn broadcast_with_report(&self, message: M) -> BroadcastReport {
        let (tx, rx) = oneshot::channel();
        self.broadcast_shared(Arc::new(message), Some(tx)).await;
        rx.await.unwrap_or_default()
    }

    async fn broadcast_shared(
        &self,
        message: Arc<M>,
        report: Option<oneshot::Sender<BroadcastReport>>,
    ) {
        let intent = Intent::Broadcast { message, report };
        if self.intents.send(intent).await.is_err() {
            warn!("hub stopped; broadcast intent discarded");
        }
    }

    /// Snapshot of the live set, ordered by connection id.
    pub async fn connections(&self) -> Vec<ConnectionSummary> {
        let (tx, rx) = oneshot::channel();
        if self.intents.send(Intent::Inspect(tx)).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections().await.len()
    }
}

struct Coordinator<M> {
    connections: HashMap<ConnectionId, Arc<Connection<M>>>,
    intents: mpsc::Receiver<Intent<M>>,
}

impl<M> Coordinator<M> {
    async fn run(mut self) {
        debug!("hub coordination loop started");
        while let Some(intent) = self.intents.recv().await {
            match intent {
                Intent::Register(conn) => self.on_register(conn),
                Intent::Unregister(conn) => self.on_unregister(&conn),
                Intent::Broadcast { message, report } => self.on_broadcast(message, report),
                Intent::Inspect(reply) => {
                    let _ = reply.send(self.summaries());
                }
            }
        }

        for conn in self.connections.values() {
            conn.close();
        }
        debug!(remaining = self.connections.len(), "hub coordination loop stopped");
    }

    fn on_register(&mut self, conn: Arc<Connection<M>>) {
        info!(
            conn_id = %conn.id(),
            user_id = conn.user_id(),
            role = %conn.role(),
            "client registered"
        );
        self.connections.insert(conn.id(), conn);
    }

    fn on_unregister(&mut self, conn: &Connection<M>) {
        if let Some(conn) = self.connections.remove(&conn.id()) {
            conn.close();
            info!(
                conn_id = %conn.id(),
                user_id = conn.user_id(),
                dropped = conn.drop_count(),
                "client unregistered"
            );
        }
    }

    fn on_broadcast(&mut self, message: Arc<M>, reply: Option<oneshot::Sender<BroadcastReport>>) {
        let mut report = BroadcastReport::default();
        for conn in self.connections.values() {
            match conn.send(Arc::clone(&message)) {
                Delivery::Queued => report.delivered += 1,
                Delivery::Dropped => {
                    report.dropped += 1;
                    warn!(
                        conn_id = %conn.id(),
                        user_id = conn.user_id(),
                        total_dropped = conn.drop_count(),
                        "outbound queue full; broadcast dropped"
                    );
                }
                Delivery::Closed => report.closed += 1,
            }
        }
        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            closed = report.closed,
            "broadcast processed"
        );
        if let Some(tx) = reply {
            let _ = tx.send(report);
        }
    }

    fn summaries(&self) -> Vec<ConnectionSummary> {
        let mut out: Vec<_> = self
            .connections
            .values()
            .map(|c| ConnectionSummary {
                id: c.id(),
                user_id: c.user_id().to_string(),
                role: c.role(),
                connected_at: c.connected_at(),
                dropped: c.drop_count(),
            })
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::ws::connection::Outbound;

    fn student(id: &str, capacity: usize) -> (Arc<Connection<String>>, Outbound<String>) {
        Connection::new(Identity::new(id, Role::Student), capacity)
    }

    #[tokio::test]
    async fn register_then_count() {
        let hub = Hub::<String>::spawn(16);
        let (c1, _r1) = student("s1", 8);
        let (c2, _r2) = student("s2", 8);
        hub.register(c1).await;
        hub.register(c2).await;
        assert_eq!(hub.connection_count().await, 2);
    }

    #[tokio::test]
    async fn broadcast_reaches_each_live_connection_once() {
        let hub = Hub::<String>::spawn(16);
        let mut receivers = Vec::new();
        for i in 0..3 {
            let (conn, rx) = student(&format!("s{i}"), 8);
            hub.register(conn).await;
            receivers.push(rx);
        }

        let report = hub.broadcast_with_report("hello".to_string()).await;
        assert_eq!(report.delivered, 3);

        for rx in receivers.iter_mut() {
            assert_eq!(*rx.recv().await.unwrap(), "hello");
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn unregistered_connection_gets_nothing_and_queue_closes() {
        let hub = Hub::<String>::spawn(16);
        let (stay, mut stay_rx) = student("stay", 8);
        let (leave, mut leave_rx) = student("leave", 8);
        hub.register(Arc::clone(&stay)).await;
        hub.register(Arc::clone(&leave)).await;

        hub.unregister(Arc::clone(&leave)).await;
        hub.broadcast("after".to_string()).await;
        assert_eq!(hub.connection_count().await, 1);

        assert_eq!(*stay_rx.recv().await.unwrap(), "after");
        assert!(leave_rx.recv().await.is_none());
        assert!(leave.is_closed());
    }

    #[tokio::test]
    async fn unregister_unknown_or_twice_is_noop() {
        let hub = Hub::<String>::spawn(16);
        let (ghost, _rx) = student("ghost", 8);
        hub.unregister(Arc::clone(&ghost)).await;
        hub.unregister(Arc::clone(&ghost)).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn late_registration_misses_earlier_broadcast() {
        let hub = Hub::<String>::spawn(16);
        hub.broadcast("early".to_string()).await;
        let (late, mut rx) = student("late", 8);
        hub.register(late).await;
        hub.broadcast("later".to_string()).await;
        assert_eq!(*rx.recv().await.unwrap(), "later");
    }

    #[tokio::test]
    async fn interleaved_intents_apply_in_arrival_order() {
        let hub = Hub::<String>::spawn(16);
        let (first, mut first_rx) = student("first", 8);
        let (second, mut second_rx) = student("second", 8);
        hub.register(Arc::clone(&first)).await;

        hub.broadcast("one".to_string()).await;
        hub.register(Arc::clone(&second)).await;
        hub.broadcast("two".to_string()).await;
        hub.unregister(Arc::clone(&first)).await;
        hub.broadcast("three".to_string()).await;
        assert_eq!(hub.connection_count().await, 1);

        assert_eq!(*first_rx.recv().await.unwrap(), "one");
        assert_eq!(*first_rx.recv().await.unwrap(), "two");
        assert!(first_rx.recv().await.is_none());

        assert_eq!(*second_rx.recv().await.unwrap(), "two");
        assert_eq!(*second_rx.recv().await.unwrap(), "three");
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_recipient_does_not_block_others() {
        let hub = Hub::<String>::spawn(16);
        let (slow, _slow_rx) = student("slow", 1);
        let (fast, mut fast_rx) = student("fast", 8);
        hub.register(Arc::clone(&slow)).await;
        hub.register(fast).await;

        hub.broadcast("one".to_string()).await;
        let report = hub.broadcast_with_report("two".to_string()).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(slow.drop_count(), 1);

        assert_eq!(*fast_rx.recv().await.unwrap(), "one");
        assert_eq!(*fast_rx.recv().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn live_set_matches_registrations_minus_unregistrations() {
        let hub = Hub::<String>::spawn(64);
        let mut conns = Vec::new();
        for i in 0..10 {
            let (conn, rx) = student(&format!("s{i}"), 4);
            conns.push((conn, rx));
        }

        let mut tasks = Vec::new();
        for (i, (conn, _)) in conns.iter().enumerate() {
            let hub = hub.clone();
            let conn = Arc::clone(conn);
            tasks.push(tokio::spawn(async move {
                hub.register(Arc::clone(&conn)).await;
                if i % 3 == 0 {
                    hub.unregister(conn).await;
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let live: Vec<_> = hub.connections().await.into_iter().map(|s| s.id).collect();
        let mut expected: Vec<_> = conns
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 0)
            .map(|(_, (c, _))| c.id())
            .collect();
        expected.sort();
        assert_eq!(live, expected);
    }

    #[tokio::test]
    async fn dropping_every_handle_closes_remaining_queues() {
        let hub = Hub::<String>::spawn(4);
        let (conn, mut rx) = student("s1", 4);
        hub.register(conn).await;
        assert_eq!(hub.connection_count().await, 1);
        drop(hub);
        assert!(rx.recv().await.is_none());
    }
}
