use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Present" => Some(Self::Present),
            "Absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// A stored attendance mark. Names are joined in from the directory at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub class_id: i64,
    pub class_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: String,
}

/// Body of `POST /attendance`. Every field is optional so that missing
/// values surface as validation errors rather than decode failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveAttendanceRequest {
    pub class_name: Option<String>,
    pub date: Option<String>,
    pub records: Option<Vec<AttendanceEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub status: Option<String>,
}

impl AttendanceEntry {
    pub fn new(student_id: i64, student_name: &str, status: &str) -> Self {
        Self {
            student_id: Some(student_id),
            student_name: Some(student_name.to_string()),
            status: Some(status.to_string()),
        }
    }
}

/// A validated entry, ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub class_name: String,
    pub date: NaiveDate,
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub attendance_rate: f64,
    pub absent_students: Vec<String>,
}
