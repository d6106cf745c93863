/// SQLite persistence for centers, students and inquiries
///
/// Row loaders take a plain `&mut SqliteConnection` so the same code reads
/// from a pooled connection or from inside an open transaction.

use crate::crm::types::{
    generate_id, timestamp_now, Center, Inquiry, InquiryDetails, InquiryStats, InquiryStatus,
    NewCenter, NewInquiry, NewStudent, Priority, StatusCount, Student, StudentStatus,
};
use crate::crm::CrmError;
use anyhow::Result;
use sqlx::{
    sqlite::{SqlitePool, SqliteRow},
    Row, SqliteConnection,
};
use std::str::FromStr;

/// Joined projection used for every inquiry read
const INQUIRY_DETAILS_SELECT: &str = r#"
    SELECT
        i.id, i.student_id, i.center_id, i.course_interest, i.source, i.notes,
        i.status, i.priority, i.created_at, i.updated_at,
        s.center_id AS s_center_id, s.first_name AS s_first_name, s.last_name AS s_last_name,
        s.email AS s_email, s.phone AS s_phone, s.status AS s_status,
        s.created_at AS s_created_at, s.updated_at AS s_updated_at,
        c.name AS c_name, c.code AS c_code, c.city AS c_city
    FROM inquiries i
    JOIN students s ON s.id = i.student_id
    JOIN centers c ON c.id = i.center_id
"#;

/// CRM storage over a shared SQLite pool
#[derive(Debug, Clone)]
pub struct CrmStorage {
    pool: SqlitePool,
}

impl CrmStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create CRM tables and indexes. Safe to call multiple times.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS centers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE,
                city TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                center_id TEXT NOT NULL REFERENCES centers(id),
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                status TEXT NOT NULL DEFAULT 'INQUIRY'
                    CHECK (status IN ('INQUIRY', 'ENROLLED', 'ACTIVE', 'COMPLETED', 'DROPPED')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS inquiries (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL REFERENCES students(id),
                center_id TEXT NOT NULL REFERENCES centers(id),
                course_interest TEXT,
                source TEXT,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'NEW'
                    CHECK (status IN ('NEW', 'FOLLOW_UP', 'QUALIFIED', 'CONVERTED', 'LOST')),
                priority TEXT NOT NULL DEFAULT 'MEDIUM'
                    CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH', 'URGENT')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_status ON students(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_inquiries_status ON inquiries(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_inquiries_student ON inquiries(student_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn create_center(&self, new: NewCenter) -> Result<Center, CrmError> {
        require_non_empty("name", &new.name)?;
        require_non_empty("code", &new.code)?;

        let center = Center {
            id: new.id.unwrap_or_else(|| generate_id("CTR")),
            name: new.name.trim().to_string(),
            code: new.code.trim().to_uppercase(),
            city: new.city,
        };

        sqlx::query("INSERT INTO centers (id, name, code, city, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&center.id)
            .bind(&center.name)
            .bind(&center.code)
            .bind(&center.city)
            .bind(timestamp_now())
            .execute(&self.pool)
            .await
            .map_err(|e| classify_write_error(e, "center"))?;

        tracing::info!("🏫 Created center: {} ({})", center.id, center.code);
        Ok(center)
    }

    pub async fn list_centers(&self) -> Result<Vec<Center>> {
        let rows = sqlx::query("SELECT id, name, code, city FROM centers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Center> {
                Ok(Center {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    code: row.try_get("code")?,
                    city: row.try_get("city")?,
                })
            })
            .collect()
    }

    /// Register a student in the INQUIRY state
    pub async fn create_student(&self, new: NewStudent) -> Result<Student, CrmError> {
        require_non_empty("first_name", &new.first_name)?;
        require_non_empty("last_name", &new.last_name)?;
        if !new.email.contains('@') {
            return Err(CrmError::Validation(format!("Invalid email: '{}'", new.email)));
        }

        let now = timestamp_now();
        let student = Student {
            id: new.id.unwrap_or_else(|| generate_id("STU")),
            center_id: new.center_id,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            phone: new.phone,
            status: StudentStatus::Inquiry,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO students
                (id, center_id, first_name, last_name, email, phone, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.center_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.status.as_str())
        .bind(&student.created_at)
        .bind(&student.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_write_error(e, "student"))?;

        tracing::info!("🎓 Created student: {} in center {}", student.id, student.center_id);
        Ok(student)
    }

    pub async fn get_student(&self, id: &str) -> Result<Option<Student>> {
        let mut conn = self.pool.acquire().await?;
        fetch_student(&mut conn, id).await
    }

    pub async fn list_students(&self, status: Option<StudentStatus>) -> Result<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT id, center_id, first_name, last_name, email, phone, status, created_at, updated_at
            FROM students
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(student_from_row).collect()
    }

    /// Open a NEW inquiry for an existing student, in the student's center
    pub async fn create_inquiry(&self, new: NewInquiry) -> Result<InquiryDetails, CrmError> {
        let mut conn = self.pool.acquire().await?;

        let student = fetch_student(&mut conn, &new.student_id)
            .await?
            .ok_or_else(|| CrmError::NotFound(format!("Student not found: {}", new.student_id)))?;

        let now = timestamp_now();
        let id = new.id.unwrap_or_else(|| generate_id("INQ"));

        sqlx::query(
            r#"
            INSERT INTO inquiries
                (id, student_id, center_id, course_interest, source, notes, status, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&student.id)
        .bind(&student.center_id)
        .bind(&new.course_interest)
        .bind(&new.source)
        .bind(&new.notes)
        .bind(InquiryStatus::New.as_str())
        .bind(new.priority.unwrap_or(Priority::Medium).as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify_write_error(e, "inquiry"))?;

        tracing::info!("📨 Created inquiry: {} for student {}", id, student.id);

        load_inquiry_details(&mut conn, &id)
            .await?
            .ok_or_else(|| CrmError::NotFound(format!("Inquiry not found: {}", id)))
    }

    pub async fn get_inquiry_details(&self, id: &str) -> Result<Option<InquiryDetails>> {
        let mut conn = self.pool.acquire().await?;
        load_inquiry_details(&mut conn, id).await
    }

    pub async fn list_inquiries(&self, status: Option<InquiryStatus>) -> Result<Vec<InquiryDetails>> {
        let query = format!(
            "{} WHERE (?1 IS NULL OR i.status = ?1) ORDER BY i.updated_at DESC, i.id",
            INQUIRY_DETAILS_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(details_from_row).collect()
    }

    /// Pipeline counts, with every status present even when zero
    pub async fn inquiry_stats(&self) -> Result<InquiryStats> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM inquiries GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut by_status: Vec<StatusCount> = InquiryStatus::ALL
            .into_iter()
            .map(|status| StatusCount { status, count: 0 })
            .collect();

        for row in &rows {
            let status: InquiryStatus = parse_column(row, "status")?;
            let count: i64 = row.try_get("count")?;
            if let Some(entry) = by_status.iter_mut().find(|entry| entry.status == status) {
                entry.count = count;
            }
        }

        Ok(InquiryStats {
            total: by_status.iter().map(|entry| entry.count).sum(),
            by_status,
        })
    }
}

/// Load one inquiry with its student and center
pub async fn load_inquiry_details(conn: &mut SqliteConnection, id: &str) -> Result<Option<InquiryDetails>> {
    let query = format!("{} WHERE i.id = ?", INQUIRY_DETAILS_SELECT);
    let row = sqlx::query(&query).bind(id).fetch_optional(&mut *conn).await?;

    row.as_ref().map(details_from_row).transpose()
}

pub async fn fetch_student(conn: &mut SqliteConnection, id: &str) -> Result<Option<Student>> {
    let row = sqlx::query(
        r#"
        SELECT id, center_id, first_name, last_name, email, phone, status, created_at, updated_at
        FROM students WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(student_from_row).transpose()
}

fn student_from_row(row: &SqliteRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        center_id: row.try_get("center_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn details_from_row(row: &SqliteRow) -> Result<InquiryDetails> {
    let inquiry = Inquiry {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        center_id: row.try_get("center_id")?,
        course_interest: row.try_get("course_interest")?,
        source: row.try_get("source")?,
        notes: row.try_get("notes")?,
        status: parse_column(row, "status")?,
        priority: parse_column(row, "priority")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    let student = Student {
        id: inquiry.student_id.clone(),
        center_id: row.try_get("s_center_id")?,
        first_name: row.try_get("s_first_name")?,
        last_name: row.try_get("s_last_name")?,
        email: row.try_get("s_email")?,
        phone: row.try_get("s_phone")?,
        status: parse_column(row, "s_status")?,
        created_at: row.try_get("s_created_at")?,
        updated_at: row.try_get("s_updated_at")?,
    };

    let center = Center {
        id: inquiry.center_id.clone(),
        name: row.try_get("c_name")?,
        code: row.try_get("c_code")?,
        city: row.try_get("c_city")?,
    };

    Ok(InquiryDetails { inquiry, student, center })
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = CrmError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("Corrupt '{}' column: {}", column, e))
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CrmError> {
    if value.trim().is_empty() {
        return Err(CrmError::Validation(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

/// Map constraint violations on insert to client errors
fn classify_write_error(err: sqlx::Error, entity: &str) -> CrmError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CrmError::Conflict(format!("A {} with that identifier already exists", entity));
        }
        if db.is_foreign_key_violation() {
            return CrmError::Validation(format!("The {} references a record that does not exist", entity));
        }
    }
    CrmError::Database(err)
}
