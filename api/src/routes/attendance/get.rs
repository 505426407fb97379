use axum::{Json, extract::State, http::StatusCode};

use crate::response::ApiResponse;
use crate::state::AppState;

use super::common::SessionOverviewResponse;

/// GET /api/attendance/session
///
/// Returns the active session and its running counts. The counts cover marked
/// students only; roster students are defaulted to absent at finalization.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "classId": 4,
///     "startedAt": "2026-03-02T08:00:00+00:00",
///     "present": 3,
///     "absent": 2,
///     "total": 5
///   },
///   "message": "Attendance session retrieved"
/// }
/// ```
///
/// - `401 Unauthorized` without a valid token (guard)
///
/// - `404 Not Found`
/// ```json
/// { "success": false, "data": { ... }, "message": "No active attendance session" }
/// ```
pub async fn get_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<SessionOverviewResponse>>) {
    match state.session().overview().await {
        Some(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SessionOverviewResponse::from(overview),
                "Attendance session retrieved",
            )),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No active attendance session")),
        ),
    }
}
