//! WebSocket plumbing shared by feature handlers: the connection hub, per
//! connection queues, and the read/write loops that drive a socket.

pub mod connection;
pub mod handler_trait;
pub mod hub;
pub mod runtime;
pub mod serve;

pub use connection::{Connection, ConnectionId, Delivery};
pub use handler_trait::WsHandler;
pub use hub::{BroadcastReport, ConnectionSummary, Hub};
pub use runtime::WsContext;
pub use serve::{WsServerOptions, serve_connection};
