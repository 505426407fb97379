use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::auth::guards::allow_teacher;
use crate::state::AppState;

pub mod common;
pub mod get;
pub mod post;

/// Builds the `/attendance` route group.
///
/// # Routes
/// - `POST /attendance/start` → start a session for a class (teacher only, `allow_teacher`)
/// - `GET  /attendance/session` → current session and its running counts
///
/// Authentication is applied by the parent router; this group only adds the
/// teacher check on `/start`. Marking, summaries and finalization happen over
/// the `/ws` socket, not here.
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/start",
            post(post::start_session).route_layer(from_fn(allow_teacher)),
        )
        .route("/session", get(get::get_session))
}
