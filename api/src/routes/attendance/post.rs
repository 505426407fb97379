use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::ws::attendance::StoreError;

use super::common::{StartSessionReq, StartedSessionResponse};

/// POST /api/attendance/start
///
/// Starts the live attendance session for `classId`, replacing any session in
/// progress. Marks recorded in the replaced session are discarded.
///
/// # Arguments
/// - `classId` (JSON body): Class whose roster the session is taken against.
///   The class must exist; its roster is read to check that.
///
/// ### Request Body
/// ```json
/// { "classId": 4 }
/// ```
///
/// ### Responses
///
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": { "classId": 4, "startedAt": "2026-03-02T08:00:00+00:00" },
///   "message": "Attendance session started"
/// }
/// ```
///
/// - `401 Unauthorized` without a valid token (guard)
/// - `403 Forbidden` for students (guard)
///
/// - `404 Not Found`
/// ```json
/// { "success": false, "data": { ... }, "message": "Class not found" }
/// ```
///
/// - `500 Internal Server Error`
/// ```json
/// { "success": false, "data": { ... }, "message": "Failed to start attendance session" }
/// ```
pub async fn start_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<StartSessionReq>,
) -> (StatusCode, Json<ApiResponse<StartedSessionResponse>>) {
    match state.store().fetch_roster(body.class_id).await {
        Ok(_) => {}
        Err(StoreError::ClassNotFound(_)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Class not found")),
            );
        }
        Err(e) => {
            error!(class_id = body.class_id, error = %e, "failed to load class");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to start attendance session")),
            );
        }
    }

    let info = state.session().start(body.class_id).await;
    info!(class_id = info.class_id, teacher = %claims.sub, "attendance session started");

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            StartedSessionResponse::from(info),
            "Attendance session started",
        )),
    )
}
