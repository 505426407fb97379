use serde::{Deserialize, Serialize};

use crate::ws::attendance::{SessionInfo, Summary};

/// Body of `POST /api/attendance/start`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionReq {
    pub class_id: i64,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartedSessionResponse {
    pub class_id: i64,
    pub started_at: String,
}

impl From<SessionInfo> for StartedSessionResponse {
    fn from(info: SessionInfo) -> Self {
        Self {
            class_id: info.class_id,
            started_at: info.started_at.to_rfc3339(),
        }
    }
}

/// Active session with its running counts. `startedAt` is RFC 3339.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverviewResponse {
    pub class_id: i64,
    pub started_at: String,
    pub present: usize,
    pub absent: usize,
    pub total: usize,
}

impl From<(SessionInfo, Summary)> for SessionOverviewResponse {
    fn from((info, summary): (SessionInfo, Summary)) -> Self {
        Self {
            class_id: info.class_id,
            started_at: info.started_at.to_rfc3339(),
            present: summary.present,
            absent: summary.absent,
            total: summary.total,
        }
    }
}
