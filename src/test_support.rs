/// Shared fixtures for unit tests

use crate::config::DatabaseConfig;
use crate::crm::types::{NewCenter, NewInquiry, NewStudent};
use crate::crm::CrmStorage;
use sqlx::sqlite::SqlitePool;

/// Timestamp written on every seeded row
pub const SEEDED_AT: &str = "2024-01-01T00:00:00.000Z";

/// Fresh on-disk database under the system temp directory
pub async fn test_pool() -> SqlitePool {
    let data_dir = std::env::temp_dir().join(format!("centerdesk-test-{}", uuid::Uuid::new_v4()));
    crate::database::connect(&DatabaseConfig {
        data_dir: data_dir.to_string_lossy().into_owned(),
        busy_timeout_ms: 5000,
        max_connections: 10,
    })
    .await
    .unwrap()
}

/// CTR-001, STU-001 (INQUIRY) and INQ-001 (QUALIFIED) linked together
pub async fn seed_pipeline(storage: &CrmStorage) {
    storage
        .create_center(NewCenter {
            id: Some("CTR-001".into()),
            name: "Downtown Campus".into(),
            code: "DTC".into(),
            city: Some("Springfield".into()),
        })
        .await
        .unwrap();

    storage
        .create_student(NewStudent {
            id: Some("STU-001".into()),
            center_id: "CTR-001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
        })
        .await
        .unwrap();

    storage
        .create_inquiry(NewInquiry {
            id: Some("INQ-001".into()),
            student_id: "STU-001".into(),
            course_interest: Some("Welding Level 2".into()),
            source: Some("walk-in".into()),
            notes: None,
            priority: None,
        })
        .await
        .unwrap();

    sqlx::query("UPDATE inquiries SET status = 'QUALIFIED', updated_at = ?1 WHERE id = 'INQ-001'")
        .bind(SEEDED_AT)
        .execute(storage.pool())
        .await
        .unwrap();

    sqlx::query("UPDATE students SET updated_at = ?1 WHERE id = 'STU-001'")
        .bind(SEEDED_AT)
        .execute(storage.pool())
        .await
        .unwrap();
}
