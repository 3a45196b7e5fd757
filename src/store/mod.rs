pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{AttendanceRecord, ClassRef, Mark, Student};

pub use memory::MemoryStore;

/// Read-only view of classes and their students, as consulted by attendance reconciliation.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_class(&self, name: &str) -> Result<Option<ClassRef>, AppError>;
    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError>;
    async fn list_active_students(&self, class_name: &str) -> Result<Vec<Student>, AppError>;

    async fn class_exists(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.find_class(name).await?.is_some())
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Records for one class and day, ordered by student name.
    async fn list_for_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Atomically drops every record of `class` on `date`, upserts `marks`
    /// keyed by `(student_id, date)`, and returns the resulting records.
    /// Fails with a validation error, writing nothing, if a marked student is
    /// no longer enrolled in `class` at write time.
    async fn replace_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
        marks: &[Mark],
    ) -> Result<Vec<AttendanceRecord>, AppError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Directory for SqliteStore {
    async fn find_class(&self, name: &str) -> Result<Option<ClassRef>, AppError> {
        Ok(repository::find_class_ref_by_name(&self.db, name).await?)
    }

    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        Ok(repository::find_student_by_id(&self.db, id).await?)
    }

    async fn list_active_students(&self, class_name: &str) -> Result<Vec<Student>, AppError> {
        Ok(repository::fetch_active_students(&self.db, class_name).await?)
    }
}

#[async_trait]
impl AttendanceStore for SqliteStore {
    async fn list_for_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(repository::fetch_attendance_for_class_day(&self.db, class.id, date).await?)
    }

    async fn replace_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
        marks: &[Mark],
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut tx = self.db.begin().await?;

        let cleared = repository::delete_attendance_for_class_day(&mut *tx, class.id, date).await?;
        debug!("cleared {} records for {} on {}", cleared, class.name, date);

        for (written, mark) in marks.iter().enumerate() {
            // enrollment is re-checked by the upsert itself, inside the transaction
            let failure = match repository::upsert_attendance(&mut *tx, class.id, date, mark).await
            {
                Ok(true) => continue,
                Ok(false) => AppError::Validation(format!(
                    "Student {} is not in class {}",
                    mark.student_id, class.name
                )),
                Err(e) => AppError::Database(e),
            };

            return Err(match tx.rollback().await {
                Ok(()) => failure,
                Err(rollback_err) => {
                    error!(
                        "rollback failed after write error ({}): {}",
                        failure, rollback_err
                    );
                    AppError::PartialApply {
                        class_name: class.name.clone(),
                        date: date.to_string(),
                        written,
                        expected: marks.len(),
                    }
                }
            });
        }

        let records = repository::fetch_attendance_for_class_day(&mut *tx, class.id, date).await?;
        tx.commit().await?;

        Ok(records)
    }
}
