//! The single active class session and its per-student statuses.
//!
//! All access goes through one `tokio::sync::Mutex`. Every operation takes the
//! lock once, does its read-modify-write, and releases it before returning, so
//! no caller ever holds it across I/O.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

/// Reported to a student whose status has not been marked yet.
pub const NOT_YET_UPDATED: &str = "not yet updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub present: usize,
    pub absent: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceStatus>,
    {
        let mut summary = Summary::default();
        for status in statuses {
            match status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
            }
        }
        summary.total = summary.present + summary.absent;
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No active attendance session")]
    NoActiveSession,
}

/// Identifies one started session. Two sessions for the same class differ by
/// `started_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub class_id: i64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ActiveSession {
    info: SessionInfo,
    statuses: HashMap<String, AttendanceStatus>,
}

/// A session removed from the shared state by finalization, with unreported
/// roster students already defaulted to absent.
#[derive(Debug)]
pub struct ClosedSession {
    pub info: SessionInfo,
    pub statuses: HashMap<String, AttendanceStatus>,
}

impl ClosedSession {
    pub fn summary(&self) -> Summary {
        Summary::from_statuses(self.statuses.values())
    }

    /// Entries ordered by student id.
    pub fn entries(&self) -> Vec<(&str, AttendanceStatus)> {
        let mut entries: Vec<_> = self
            .statuses
            .iter()
            .map(|(student, status)| (student.as_str(), *status))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Marks every roster student missing from `statuses` as absent. Returns how
/// many were added; a second call with the same roster adds none.
pub fn default_absent(statuses: &mut HashMap<String, AttendanceStatus>, roster: &[String]) -> usize {
    let mut added = 0;
    for student in roster {
        if !statuses.contains_key(student) {
            statuses.insert(student.clone(), AttendanceStatus::Absent);
            added += 1;
        }
    }
    added
}

#[derive(Debug, Default)]
pub struct AttendanceSession {
    inner: Mutex<Option<ActiveSession>>,
}

impl AttendanceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `class_id`, replacing any session in progress.
    pub async fn start(&self, class_id: i64) -> SessionInfo {
        let info = SessionInfo {
            class_id,
            started_at: Utc::now(),
        };
        let mut guard = self.inner.lock().await;
        if let Some(previous) = guard.replace(ActiveSession {
            info,
            statuses: HashMap::new(),
        }) {
            info!(
                previous_class_id = previous.info.class_id,
                unsaved = previous.statuses.len(),
                "attendance session replaced"
            );
        }
        info
    }

    pub async fn mark(&self, student_id: &str, status: AttendanceStatus) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoActiveSession)?;
        session.statuses.insert(student_id.to_owned(), status);
        Ok(())
    }

    pub async fn summarize(&self) -> Result<Summary, SessionError> {
        let guard = self.inner.lock().await;
        let session = guard.as_ref().ok_or(SessionError::NoActiveSession)?;
        Ok(Summary::from_statuses(session.statuses.values()))
    }

    /// `Ok(None)` means the student has not been marked yet.
    pub async fn lookup(&self, student_id: &str) -> Result<Option<AttendanceStatus>, SessionError> {
        let guard = self.inner.lock().await;
        let session = guard.as_ref().ok_or(SessionError::NoActiveSession)?;
        Ok(session.statuses.get(student_id).copied())
    }

    pub async fn info(&self) -> Option<SessionInfo> {
        self.inner.lock().await.as_ref().map(|s| s.info)
    }

    pub async fn overview(&self) -> Option<(SessionInfo, Summary)> {
        self.inner
            .lock()
            .await
            .as_ref()
            .map(|s| (s.info, Summary::from_statuses(s.statuses.values())))
    }

    /// Reconciles the session identified by `expected` against `roster` and
    /// removes it from the shared state in the same critical section.
    ///
    /// Returns `None` if that session is no longer the active one.
    pub async fn close_reconciled(&self, expected: SessionInfo, roster: &[String]) -> Option<ClosedSession> {
        let mut guard = self.inner.lock().await;
        if guard.as_ref().map(|s| s.info) != Some(expected) {
            return None;
        }
        let mut session = guard.take()?;
        default_absent(&mut session.statuses, roster);
        Some(ClosedSession {
            info: session.info,
            statuses: session.statuses,
        })
    }

    /// Puts a closed session back, unless another session has started since.
    pub async fn reopen(&self, closed: ClosedSession) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.is_some() {
            return false;
        }
        *guard = Some(ActiveSession {
            info: closed.info,
            statuses: closed.statuses,
        });
        true
    }
}
