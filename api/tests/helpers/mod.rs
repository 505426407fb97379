pub mod app;
pub mod ws;

pub use app::{make_test_app, token_for};
pub use ws::{connect_ws, next_event, send_event, spawn_server, wait_for_connections};
