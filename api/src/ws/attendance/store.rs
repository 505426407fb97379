//! Storage seam used by finalization: read a roster, append a record.

use async_trait::async_trait;
use db::repositories::{AttendanceRepository, NewAttendanceRecord, RosterError};
use sea_orm::{DatabaseConnection, DbErr};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Class {0} not found")]
    ClassNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RosterError> for StoreError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::ClassNotFound(id) => StoreError::ClassNotFound(id),
            RosterError::Database(e) => StoreError::Database(e),
        }
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Student ids of the class, in roster order.
    async fn fetch_roster(&self, class_id: i64) -> Result<Vec<String>, StoreError>;

    /// Writes one finalized record. Re-persisting a record of the same
    /// session overwrites its status instead of adding a second row.
    async fn persist_attendance(&self, record: &NewAttendanceRecord) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct DbAttendanceStore {
    repo: AttendanceRepository,
}

impl DbAttendanceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            repo: AttendanceRepository::new(db),
        }
    }
}

#[async_trait]
impl AttendanceStore for DbAttendanceStore {
    async fn fetch_roster(&self, class_id: i64) -> Result<Vec<String>, StoreError> {
        Ok(self.repo.fetch_roster(class_id).await?)
    }

    async fn persist_attendance(&self, record: &NewAttendanceRecord) -> Result<(), StoreError> {
        self.repo.persist_attendance(record).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for handler and finalize tests.
    #[derive(Default)]
    pub struct MemoryStore {
        rosters: Mutex<HashMap<i64, Vec<String>>>,
        records: Mutex<Vec<NewAttendanceRecord>>,
        failing: Mutex<HashSet<String>>,
    }

    impl MemoryStore {
        pub fn with_roster(class_id: i64, students: &[&str]) -> Self {
            let store = Self::default();
            store
                .rosters
                .lock()
                .unwrap()
                .insert(class_id, students.iter().map(|s| s.to_string()).collect());
            store
        }

        /// Makes persisting records for `student_id` fail until cleared.
        pub fn fail_for(&self, student_id: &str) {
            self.failing.lock().unwrap().insert(student_id.to_string());
        }

        pub fn clear_failures(&self) {
            self.failing.lock().unwrap().clear();
        }

        pub fn records(&self) -> Vec<NewAttendanceRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AttendanceStore for MemoryStore {
        async fn fetch_roster(&self, class_id: i64) -> Result<Vec<String>, StoreError> {
            self.rosters
                .lock()
                .unwrap()
                .get(&class_id)
                .cloned()
                .ok_or(StoreError::ClassNotFound(class_id))
        }

        async fn persist_attendance(&self, record: &NewAttendanceRecord) -> Result<(), StoreError> {
            if self.failing.lock().unwrap().contains(&record.student_id) {
                return Err(StoreError::Database(DbErr::Custom("write refused".into())));
            }
            let mut records = self.records.lock().unwrap();
            let existing = records.iter_mut().find(|r| {
                r.class_id == record.class_id
                    && r.student_id == record.student_id
                    && r.session_started_at == record.session_started_at
            });
            match existing {
                Some(stored) => stored.status = record.status.clone(),
                None => records.push(record.clone()),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use db::test_utils::{seed_class, setup_test_db};

    #[tokio::test]
    async fn db_store_reads_roster_and_overwrites_repeated_records() {
        let db = setup_test_db().await;
        let class = seed_class(&db, "COS 301", "t1", &["b", "a"]).await;
        let store = DbAttendanceStore::new(db.clone());

        assert_eq!(store.fetch_roster(class.id).await.unwrap(), vec!["b", "a"]);

        let record = NewAttendanceRecord {
            class_id: class.id,
            student_id: "a".into(),
            status: "present".into(),
            session_started_at: Utc::now(),
        };
        store.persist_attendance(&record).await.unwrap();
        store
            .persist_attendance(&NewAttendanceRecord {
                status: "absent".into(),
                ..record.clone()
            })
            .await
            .unwrap();

        let repo = AttendanceRepository::new(db);
        let rows = repo.records_for_class(class.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "absent");
    }

    #[tokio::test]
    async fn db_store_maps_missing_class() {
        let db = setup_test_db().await;
        let store = DbAttendanceStore::new(db);
        assert!(matches!(
            store.fetch_roster(99).await,
            Err(StoreError::ClassNotFound(99))
        ));
    }
}
