use serde::Serialize;

/// JSON envelope shared by every HTTP endpoint.
///
/// Every route answers with the same shape:
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `success` tells the client whether the operation went through.
/// - `message` is a human-readable description of the outcome.
///
/// ## Example (success):
/// ```json
/// {
///   "success": true,
///   "data": { "classId": 4, "startedAt": "2026-03-02T08:00:00Z" },
///   "message": "Attendance session started"
/// }
/// ```
///
/// ## Example (error):
/// ```json
/// {
///   "success": false,
///   "data": { "classId": 0, "startedAt": "" },
///   "message": "Class not found"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Builds a success envelope.
    ///
    /// # Arguments
    /// - `data`: The result payload.
    /// - `message`: Describes what succeeded.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Builds an error envelope with `T::default()` as `data`.
    ///
    /// # Arguments
    /// - `message`: Describes the failure; shown to the client as-is.
    ///
    /// # Requires
    /// - `T: Default`, since an error carries no useful payload.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Default)]
    struct Payload {
        count: u32,
    }

    #[test]
    fn error_envelope_uses_default_data() {
        let body = serde_json::to_value(ApiResponse::<Payload>::error("Class not found")).unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "data": { "count": 0 }, "message": "Class not found" })
        );
    }

    #[test]
    fn success_envelope_carries_data() {
        let body = serde_json::to_value(ApiResponse::success(Payload { count: 3 }, "ok")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["count"], 3);
    }
}
