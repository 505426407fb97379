//! Ends the active session: defaults unreported roster students to absent and
//! writes one record per student.
//!
//! The session lock is held only for the in-memory reconciliation. The roster
//! fetch happens before it and the writes after it. Writes are best-effort: all
//! of them are attempted, and if any fail the session is put back so the
//! teacher can retry. A retry rewrites every row, so marks corrected between
//! the two attempts reach storage too.

use db::repositories::NewAttendanceRecord;
use tracing::{info, warn};

use super::session::{AttendanceSession, SessionError, SessionInfo, Summary};
use super::store::{AttendanceStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to load class roster: {0}")]
    Roster(#[from] StoreError),
    #[error("Attendance session changed during finalization")]
    SessionChanged,
    #[error("Failed to persist {failed} of {total} attendance records; session kept open for retry")]
    PartialPersistence { failed: usize, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub info: SessionInfo,
    pub summary: Summary,
}

impl FinalizeOutcome {
    pub fn message(&self) -> String {
        format!("Attendance for class {} has been finalized", self.info.class_id)
    }
}

pub async fn finalize(
    session: &AttendanceSession,
    store: &dyn AttendanceStore,
) -> Result<FinalizeOutcome, FinalizeError> {
    let info = session.info().await.ok_or(SessionError::NoActiveSession)?;
    let roster = store.fetch_roster(info.class_id).await?;

    let closed = session
        .close_reconciled(info, &roster)
        .await
        .ok_or(FinalizeError::SessionChanged)?;

    let records: Vec<NewAttendanceRecord> = closed
        .entries()
        .into_iter()
        .map(|(student_id, status)| NewAttendanceRecord {
            class_id: info.class_id,
            student_id: student_id.to_owned(),
            status: status.as_str().to_owned(),
            session_started_at: info.started_at,
        })
        .collect();

    let total = records.len();
    let mut failed = 0;
    for record in &records {
        if let Err(e) = store.persist_attendance(record).await {
            failed += 1;
            warn!(
                class_id = info.class_id,
                student_id = %record.student_id,
                error = %e,
                "failed to persist attendance record"
            );
        }
    }

    let summary = closed.summary();
    if failed > 0 {
        if !session.reopen(closed).await {
            warn!(class_id = info.class_id, "session replaced before it could be restored");
        }
        return Err(FinalizeError::PartialPersistence { failed, total });
    }

    info!(
        class_id = info.class_id,
        present = summary.present,
        absent = summary.absent,
        total = summary.total,
        "attendance finalized"
    );
    Ok(FinalizeOutcome { info, summary })
}
