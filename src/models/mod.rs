pub mod attendance;
pub mod class;
pub mod search;
pub mod student;
pub mod teams;

pub use attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceStatus, AttendanceSummary, Mark, RosterEntry,
    SaveAttendanceRequest,
};
pub use class::{Class, ClassRef, NewClassRequest, UpdateClassRequest};
pub use search::{SearchResponse, SearchResult};
pub use student::{NewStudentRequest, Student, StudentStatus, UpdateStudentRequest};
pub use teams::{SendMessageRequest, SendMessageResponse};
