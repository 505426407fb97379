//! The two storage operations the attendance core depends on: reading a
//! class roster and writing a finalized attendance row.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::models::attendance_record::{self, Column as RecordColumn, Entity as RecordEntity};
use crate::models::class::Entity as ClassEntity;
use crate::models::class_student::{Column as StudentColumn, Entity as StudentEntity};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("class {0} not found")]
    ClassNotFound(i64),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendanceRecord {
    pub class_id: i64,
    pub student_id: String,
    pub status: String,
    pub session_started_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AttendanceRepository {
    db: DatabaseConnection,
}

impl AttendanceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Student ids of `class_id` in enrolment order.
    pub async fn fetch_roster(&self, class_id: i64) -> Result<Vec<String>, RosterError> {
        if ClassEntity::find_by_id(class_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(RosterError::ClassNotFound(class_id));
        }

        let roster = StudentEntity::find()
            .select_only()
            .column(StudentColumn::StudentId)
            .filter(StudentColumn::ClassId.eq(class_id))
            .order_by_asc(StudentColumn::Position)
            .order_by_asc(StudentColumn::StudentId)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(roster)
    }

    /// Writes the row for `(class, student, session)`. A row already stored
    /// for the same key (from an earlier, partially failed finalize) takes the
    /// new status, so a retry always leaves storage matching the session.
    pub async fn persist_attendance(&self, record: &NewAttendanceRecord) -> Result<(), DbErr> {
        let active = attendance_record::ActiveModel {
            id: NotSet,
            class_id: Set(record.class_id),
            student_id: Set(record.student_id.clone()),
            status: Set(record.status.clone()),
            session_started_at: Set(record.session_started_at),
            recorded_at: Set(Utc::now()),
        };

        RecordEntity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    RecordColumn::ClassId,
                    RecordColumn::StudentId,
                    RecordColumn::SessionStartedAt,
                ])
                .update_columns([RecordColumn::Status, RecordColumn::RecordedAt])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn records_for_class(
        &self,
        class_id: i64,
    ) -> Result<Vec<attendance_record::Model>, DbErr> {
        RecordEntity::find()
            .filter(RecordColumn::ClassId.eq(class_id))
            .order_by_asc(RecordColumn::StudentId)
            .all(&self.db)
            .await
    }
}
