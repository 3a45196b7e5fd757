pub mod attendance;
pub mod locks;
pub mod search;

pub use attendance::AttendanceService;
pub use locks::ClassDayLocks;
