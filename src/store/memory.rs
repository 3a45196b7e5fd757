use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceStatus, ClassRef, Mark, Student, StudentStatus};
use crate::store::{AttendanceStore, Directory};

#[derive(Debug, Clone)]
struct StoredMark {
    id: i64,
    student_id: i64,
    class_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
    created_at: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    classes: Vec<ClassRef>,
    students: Vec<Student>,
    marks: Vec<StoredMark>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn class_by_name(&self, name: &str) -> Option<&ClassRef> {
        self.classes.iter().find(|c| c.name == name)
    }

    fn records_for(&self, class_id: i64, date: NaiveDate) -> Vec<AttendanceRecord> {
        let mut records: Vec<AttendanceRecord> = self
            .marks
            .iter()
            .filter(|m| m.class_id == class_id && m.date == date)
            .filter_map(|m| {
                let student = self.students.iter().find(|s| s.id == m.student_id)?;
                let class = self.classes.iter().find(|c| c.id == m.class_id)?;
                Some(AttendanceRecord {
                    id: m.id,
                    student_id: m.student_id,
                    student_name: student.name.clone(),
                    class_id: m.class_id,
                    class_name: class.name.clone(),
                    date: m.date,
                    status: m.status,
                    created_at: m.created_at.clone(),
                })
            })
            .collect();
        records.sort_by(|a, b| {
            a.student_name
                .cmp(&b.student_name)
                .then(a.student_id.cmp(&b.student_id))
        });
        records
    }
}

/// Directory and attendance store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_class(&self, name: &str) -> ClassRef {
        let mut state = self.state.write().await;
        let class = ClassRef {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.classes.push(class.clone());
        class
    }

    /// Enrolls a student; `None` when the class is unknown.
    pub async fn add_student(
        &self,
        name: &str,
        class_name: &str,
        status: StudentStatus,
    ) -> Option<Student> {
        let mut state = self.state.write().await;
        let class_id = state.class_by_name(class_name)?.id;
        let now = Utc::now().to_rfc3339();
        let student = Student {
            id: state.next_id(),
            name: name.to_string(),
            class_id,
            class_name: class_name.to_string(),
            email: None,
            status,
            created_at: now.clone(),
            updated_at: now,
        };
        state.students.push(student.clone());
        Some(student)
    }

    /// Moves a student to another class; `false` when either is unknown.
    pub async fn move_student(&self, student_id: i64, class_name: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(class_id) = state.class_by_name(class_name).map(|c| c.id) else {
            return false;
        };
        match state.students.iter_mut().find(|s| s.id == student_id) {
            Some(student) => {
                student.class_id = class_id;
                student.class_name = class_name.to_string();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_class(&self, name: &str) -> Result<Option<ClassRef>, AppError> {
        Ok(self.state.read().await.class_by_name(name).cloned())
    }

    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        let state = self.state.read().await;
        Ok(state.students.iter().find(|s| s.id == id).cloned())
    }

    async fn list_active_students(&self, class_name: &str) -> Result<Vec<Student>, AppError> {
        let state = self.state.read().await;
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|s| s.class_name == class_name && s.status == StudentStatus::Active)
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(students)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn list_for_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self.state.read().await.records_for(class.id, date))
    }

    async fn replace_class_day(
        &self,
        class: &ClassRef,
        date: NaiveDate,
        marks: &[Mark],
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now().to_rfc3339();

        let stray = marks.iter().find(|mark| {
            !state
                .students
                .iter()
                .any(|s| s.id == mark.student_id && s.class_id == class.id)
        });
        if let Some(mark) = stray {
            return Err(AppError::Validation(format!(
                "Student {} is not in class {}",
                mark.student_id, class.name
            )));
        }

        state
            .marks
            .retain(|m| !(m.class_id == class.id && m.date == date));

        for mark in marks {
            let existing = state
                .marks
                .iter()
                .position(|m| m.student_id == mark.student_id && m.date == date);
            match existing {
                Some(idx) => {
                    let stored = &mut state.marks[idx];
                    stored.class_id = class.id;
                    stored.status = mark.status;
                    stored.created_at = now.clone();
                }
                None => {
                    let id = state.next_id();
                    state.marks.push(StoredMark {
                        id,
                        student_id: mark.student_id,
                        class_id: class.id,
                        date,
                        status: mark.status,
                        created_at: now.clone(),
                    });
                }
            }
        }

        Ok(state.records_for(class.id, date))
    }
}
