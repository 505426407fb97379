//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness and hub/session status (public)
//! - `/attendance` → start and inspect the live attendance session (authenticated;
//!   starting is teacher-only)

use crate::auth::guards::allow_authenticated;
use crate::routes::{attendance::attendance_routes, health::health_routes};
use crate::state::AppState;
use axum::{Router, middleware::from_fn};

pub mod attendance;
pub mod health;

/// Builds the router mounted under `/api`.
///
/// The returned router has `AppState` as its state type.
///
/// # Route Structure:
/// - `/health` → Liveness, live socket count and session flag (no authentication required).
/// - `/attendance` → Session control and overview (requires a valid token via
///   `allow_authenticated`; `POST /attendance/start` is further restricted to teachers).
///
/// The WebSocket endpoint `/ws` is not part of this router; it is merged at the
/// application root by [`crate::app`].
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
}
