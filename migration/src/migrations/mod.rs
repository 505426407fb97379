pub mod m202601100001_create_classes;
pub mod m202601100002_create_class_students;
pub mod m202601100003_create_attendance_records;
