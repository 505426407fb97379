use axum::{
    Extension, Router,
    extract::{State, WebSocketUpgrade},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
};
use util::ws::serve_connection;

use crate::{auth::AuthUser, auth::guards::allow_authenticated, state::AppState};

pub mod attendance;

/// Builds the `/ws` route. The upgrade is only accepted for authenticated
/// callers; their claims become the connection's identity.
pub fn ws_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(attendance_ws_handler))
        .route_layer(from_fn(allow_authenticated))
}

/// GET /ws
///
/// Upgrades to the attendance socket. The token may be passed as a Bearer
/// header or as `?token=` since browsers cannot set headers on upgrades.
pub async fn attendance_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    let identity = claims.identity();
    let hub = state.hub().clone();
    let handler = state.attendance_handler();
    let opts = state.ws_options();

    ws.on_upgrade(move |socket| serve_connection(socket, hub, identity, handler, opts))
}
