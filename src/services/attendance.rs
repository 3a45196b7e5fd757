use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{
    AttendanceEntry, AttendanceRecord, AttendanceStatus, AttendanceSummary, ClassRef, Mark,
    RosterEntry, SaveAttendanceRequest,
};
use crate::services::locks::ClassDayLocks;
use crate::store::{AttendanceStore, Directory};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A submission that passed every precondition and can be written.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRoster {
    class: ClassRef,
    date: NaiveDate,
    marks: Vec<Mark>,
}

pub struct AttendanceService {
    directory: Arc<dyn Directory>,
    store: Arc<dyn AttendanceStore>,
    locks: ClassDayLocks,
    timeout: Duration,
}

impl AttendanceService {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn AttendanceStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            store,
            locks: ClassDayLocks::new(),
            timeout,
        }
    }

    /// Replaces the attendance of one class on one day with the submitted
    /// entries. Nothing is written unless every entry validates.
    pub async fn reconcile(
        &self,
        req: SaveAttendanceRequest,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        match tokio::time::timeout(self.timeout, self.reconcile_inner(req)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("attendance reconciliation timed out after {:?}", self.timeout);
                Err(AppError::Timeout)
            }
        }
    }

    async fn reconcile_inner(
        &self,
        req: SaveAttendanceRequest,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let (class, date, entries) = self.validate_header(req).await?;

        // held across entry validation and the write so both see the same enrollment
        let _guard = self.locks.acquire(class.id, date).await;
        let roster = self.validate_entries(class, date, &entries).await?;

        info!(
            "Saving attendance for {} on {} ({} entries)",
            roster.class.name,
            roster.date,
            roster.marks.len()
        );

        let records = self
            .store
            .replace_class_day(&roster.class, roster.date, &roster.marks)
            .await?;

        info!(
            "Attendance saved for {} on {}: {} records",
            roster.class.name,
            roster.date,
            records.len()
        );
        Ok(records)
    }

    /// Checks required fields, then the date, then that the class exists.
    async fn validate_header(
        &self,
        req: SaveAttendanceRequest,
    ) -> Result<(ClassRef, NaiveDate, Vec<AttendanceEntry>), AppError> {
        let class_name = req.class_name.filter(|s| !s.trim().is_empty());
        let date = req.date.filter(|s| !s.trim().is_empty());
        let entries = req.records.filter(|r| !r.is_empty());

        let (Some(class_name), Some(date), Some(entries)) = (class_name, date, entries) else {
            return Err(AppError::Validation(
                "Class name, date, and a non-empty records array are required".to_string(),
            ));
        };
        let date = parse_date(&date)?;

        let class = self
            .directory
            .find_class(&class_name)
            .await?
            .ok_or_else(|| AppError::UnknownClass(class_name.clone()))?;

        Ok((class, date, entries))
    }

    /// Checks each entry's enrollment and status in order; the first failure is returned.
    async fn validate_entries(
        &self,
        class: ClassRef,
        date: NaiveDate,
        entries: &[AttendanceEntry],
    ) -> Result<ValidatedRoster, AppError> {
        let mut marks = Vec::with_capacity(entries.len());
        for entry in entries {
            marks.push(self.validate_entry(&class, entry).await?);
        }

        Ok(ValidatedRoster { class, date, marks })
    }

    async fn validate_entry(
        &self,
        class: &ClassRef,
        entry: &AttendanceEntry,
    ) -> Result<Mark, AppError> {
        let label = entry_label(entry);

        let student = match entry.student_id {
            Some(id) => self.directory.find_student(id).await?,
            None => None,
        };
        let student = match student {
            Some(s) if s.class_id == class.id => s,
            _ => {
                return Err(AppError::Validation(format!(
                    "Student {} is not in class {}",
                    label, class.name
                )));
            }
        };

        let status = entry
            .status
            .as_deref()
            .and_then(AttendanceStatus::parse)
            .ok_or_else(|| AppError::Validation(format!("Invalid status for student {}", label)))?;

        Ok(Mark {
            student_id: student.id,
            status,
        })
    }

    /// Stored records for a class day; an unknown class has none.
    pub async fn list(
        &self,
        class_name: &str,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        match self.directory.find_class(class_name).await? {
            Some(class) => self.store.list_for_class_day(&class, date).await,
            None => Ok(Vec::new()),
        }
    }

    /// Active students of the class, each with the stored mark for `date`,
    /// or `Present` when none was taken yet.
    pub async fn roster(
        &self,
        class_name: &str,
        date: NaiveDate,
    ) -> Result<Vec<RosterEntry>, AppError> {
        let class = self.require_class(class_name).await?;
        let students = self.directory.list_active_students(&class.name).await?;
        let records = self.store.list_for_class_day(&class, date).await?;

        Ok(students
            .into_iter()
            .map(|student| {
                let existing = records.iter().find(|r| r.student_id == student.id);
                RosterEntry {
                    student_id: student.id,
                    student_name: student.name,
                    status: existing.map_or(AttendanceStatus::Present, |r| r.status),
                    recorded: existing.is_some(),
                }
            })
            .collect())
    }

    pub async fn summary(
        &self,
        class_name: &str,
        date: NaiveDate,
    ) -> Result<AttendanceSummary, AppError> {
        let class = self.require_class(class_name).await?;
        let records = self.store.list_for_class_day(&class, date).await?;
        Ok(summarize(&class, date, &records))
    }

    async fn require_class(&self, class_name: &str) -> Result<ClassRef, AppError> {
        self.directory
            .find_class(class_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_name)))
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date {:?}, expected YYYY-MM-DD", raw)))
}

/// Extracts the `(class_name, date)` key shared by the attendance read endpoints.
pub fn require_key(
    class_name: Option<String>,
    date: Option<String>,
) -> Result<(String, NaiveDate), AppError> {
    match (
        class_name.filter(|s| !s.trim().is_empty()),
        date.filter(|s| !s.trim().is_empty()),
    ) {
        (Some(class_name), Some(date)) => Ok((class_name, parse_date(&date)?)),
        _ => Err(AppError::Validation(
            "Class name and date are required".to_string(),
        )),
    }
}

fn entry_label(entry: &AttendanceEntry) -> String {
    match (&entry.student_name, entry.student_id) {
        (Some(name), _) if !name.trim().is_empty() => name.clone(),
        (_, Some(id)) => id.to_string(),
        _ => "(unknown)".to_string(),
    }
}

fn summarize(class: &ClassRef, date: NaiveDate, records: &[AttendanceRecord]) -> AttendanceSummary {
    let total = records.len();
    let absent_students: Vec<String> = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Absent)
        .map(|r| r.student_name.clone())
        .collect();
    let absent = absent_students.len();
    let present = total - absent;
    let attendance_rate = if total == 0 {
        0.0
    } else {
        (present as f64 * 1000.0 / total as f64).round() / 10.0
    };

    AttendanceSummary {
        class_name: class.name.clone(),
        date,
        total,
        present,
        absent,
        attendance_rate,
        absent_students,
    }
}
