use std::net::SocketAddr;
use std::time::Duration;

use api::state::AppState;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest},
};
use url::Url;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the app on a random local port. The listener is bound before this
/// returns, so clients can connect immediately.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

/// Connects to `/ws?token=...`.
pub async fn connect_ws(
    addr: &SocketAddr,
    token: &str,
) -> Result<(WsClient, axum::http::Response<Option<Vec<u8>>>), tokio_tungstenite::tungstenite::Error> {
    let url = Url::parse(&format!("ws://{}/ws?token={}", addr, token)).unwrap();
    let req = url.to_string().into_client_request().unwrap();
    connect_async(req).await
}

pub async fn send_event(ws: &mut WsClient, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// Next JSON text frame, skipping control frames.
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Waits until the hub reports exactly `n` live connections.
pub async fn wait_for_connections(state: &AppState, n: usize) {
    for _ in 0..100 {
        if state.hub().connection_count().await == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub never reached {n} connections");
}
