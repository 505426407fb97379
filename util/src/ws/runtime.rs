use std::sync::Arc;

use tracing::warn;

use super::connection::{Connection, Delivery};
use super::hub::Hub;
use crate::identity::Identity;

/// Per-connection handle given to a [`WsHandler`](super::handler_trait::WsHandler).
pub struct WsContext<M> {
    connection: Arc<Connection<M>>,
    hub: Hub<M>,
}

impl<M> WsContext<M>
where
    M: Send + Sync + 'static,
{
    pub fn new(connection: Arc<Connection<M>>, hub: Hub<M>) -> Self {
        Self { connection, hub }
    }

    pub fn identity(&self) -> &Identity {
        self.connection.identity()
    }

    pub fn connection(&self) -> &Arc<Connection<M>> {
        &self.connection
    }

    pub fn hub(&self) -> &Hub<M> {
        &self.hub
    }

    /// Queue an event for this client only.
    pub fn reply(&self, message: M) -> Delivery {
        let delivery = self.connection.send(Arc::new(message));
        if delivery == Delivery::Dropped {
            warn!(
                conn_id = %self.connection.id(),
                user_id = self.connection.user_id(),
                "outbound queue full; reply dropped"
            );
        }
        delivery
    }

    /// Queue an event for every registered client, this one included.
    pub async fn broadcast(&self, message: M) {
        self.hub.broadcast(message).await;
    }
}
