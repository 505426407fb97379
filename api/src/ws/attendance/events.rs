//! Wire frames for the attendance socket.
//!
//! Inbound: `{"event": <name>, "data": <payload>}`. The envelope is parsed
//! first and `data` is only interpreted once the name is known, so an unknown
//! name is reported as such rather than as a malformed frame.
//!
//! Outbound frames use the same envelope, produced by [`ServerEvent`]'s
//! adjacent tagging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use util::identity::Role;

use super::error::ProtocolError;
use super::session::{AttendanceStatus, Summary};

pub const ATTENDANCE_MARKED: &str = "ATTENDANCE_MARKED";
pub const TODAY_SUMMARY: &str = "TODAY_SUMMARY";
pub const MY_ATTENDANCE: &str = "MY_ATTENDANCE";
pub const DONE: &str = "DONE";

/// Role allowed to send the named event, or `None` for unknown names.
pub fn required_role(event: &str) -> Option<Role> {
    match event {
        ATTENDANCE_MARKED | TODAY_SUMMARY | DONE => Some(Role::Teacher),
        MY_ATTENDANCE => Some(Role::Student),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkPayload {
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    AttendanceMarked(MarkPayload),
    TodaySummary,
    MyAttendance,
    Done,
}

impl TryFrom<ClientFrame> for ClientEvent {
    type Error = ProtocolError;

    fn try_from(frame: ClientFrame) -> Result<Self, Self::Error> {
        match frame.event.as_str() {
            ATTENDANCE_MARKED => {
                let payload: MarkPayload = serde_json::from_value(frame.data)
                    .map_err(|_| ProtocolError::InvalidPayload { event: ATTENDANCE_MARKED })?;
                if payload.student_id.trim().is_empty() {
                    return Err(ProtocolError::InvalidPayload { event: ATTENDANCE_MARKED });
                }
                Ok(ClientEvent::AttendanceMarked(payload))
            }
            TODAY_SUMMARY => Ok(ClientEvent::TodaySummary),
            MY_ATTENDANCE => Ok(ClientEvent::MyAttendance),
            DONE => Ok(ClientEvent::Done),
            _ => Err(ProtocolError::UnrecognizedEvent(frame.event)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "ATTENDANCE_MARKED")]
    AttendanceMarked {
        #[serde(rename = "studentID")]
        student_id: String,
        status: AttendanceStatus,
    },
    #[serde(rename = "TODAY_SUMMARY")]
    TodaySummary(Summary),
    #[serde(rename = "MY_ATTENDANCE")]
    MyAttendance { status: String },
    #[serde(rename = "DONE")]
    Done {
        message: String,
        present: usize,
        absent: usize,
        total: usize,
    },
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl ServerEvent {
    pub fn done(message: impl Into<String>, summary: Summary) -> Self {
        ServerEvent::Done {
            message: message.into(),
            present: summary.present,
            absent: summary.absent,
            total: summary.total,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}
