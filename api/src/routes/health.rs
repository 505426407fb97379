use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Payload of `GET /api/health`.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub session_active: bool,
}

/// Builds the `/health` route group.
///
/// # Routes
/// - `GET /health` → `health_check`
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /health
///
/// Returns a success envelope with the number of live sockets and whether an
/// attendance session is running.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "OK", "connections": 12, "sessionActive": true },
///   "message": "Health check passed"
/// }
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "OK",
        connections: state.hub().connection_count().await,
        session_active: state.session().info().await.is_some(),
    };
    Json(ApiResponse::success(body, "Health check passed"))
}
