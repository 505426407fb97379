use migration::Migrator;
use sea_orm::{ActiveModelTrait, ActiveValue::{NotSet, Set}, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::models::{class, class_student};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Inserts a class and its roster, in the given order.
pub async fn seed_class(
    db: &DatabaseConnection,
    name: &str,
    teacher_id: &str,
    students: &[&str],
) -> class::Model {
    let class = class::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        teacher_id: Set(teacher_id.to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to insert class");

    for (position, student_id) in students.iter().enumerate() {
        class_student::ActiveModel {
            class_id: Set(class.id),
            student_id: Set(student_id.to_string()),
            position: Set(position as i32),
        }
        .insert(db)
        .await
        .expect("Failed to insert class student");
    }

    class
}
