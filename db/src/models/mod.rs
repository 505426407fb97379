pub mod attendance_record;
pub mod class;
pub mod class_student;

pub use attendance_record::Entity as AttendanceRecord;
pub use class::Entity as Class;
pub use class_student::Entity as ClassStudent;
