use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

use super::runtime::WsContext;

pub trait WsHandler: Send + Sync + 'static {
    /// The incoming frame type your handler understands.
    type In: DeserializeOwned + Send;

    /// The outgoing event type queued on connections and written as JSON.
    type Out: Serialize + Send + Sync + 'static;

    /// Called once after the connection has been registered with the hub.
    fn on_open(&self, ctx: &WsContext<Self::Out>) -> impl Future<Output = ()> + Send {
        async move {
            let _ = ctx;
        }
    }

    /// Called for every frame that parsed as `Self::In`.
    fn on_message(
        &self,
        ctx: &WsContext<Self::Out>,
        msg: Self::In,
    ) -> impl Future<Output = ()> + Send;

    /// Called for frames that are not valid `Self::In`. The connection stays open.
    fn on_malformed(
        &self,
        ctx: &WsContext<Self::Out>,
        error: serde_json::Error,
    ) -> impl Future<Output = ()> + Send;

    /// Called when the read loop ends, before the socket is closed and the
    /// connection unregistered.
    fn on_close(&self, ctx: &WsContext<Self::Out>) -> impl Future<Output = ()> + Send {
        async move {
            let _ = ctx;
        }
    }
}
