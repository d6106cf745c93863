/// Inquiry status updates and inquiry-to-student conversion
///
/// Converting an inquiry enrolls its student in the same unit of work: the
/// write lock is taken at `BEGIN IMMEDIATE`, the student is enrolled, the
/// inquiry is marked CONVERTED, and only then is the transaction committed.
/// Any error before commit drops the transaction, which rolls it back.
///
/// Every other status or priority change is a single-row update that never
/// touches the student. CONVERTED and LOST are terminal: neither can be left
/// through a status change.

use crate::crm::storage::load_inquiry_details;
use crate::crm::types::{timestamp_now, InquiryDetails, InquiryStatus, InquiryUpdate, Priority, StudentStatus};
use crate::crm::CrmError;
use sqlx::{sqlite::SqlitePool, Row};

/// Applies inquiry updates while keeping the inquiry/student pair consistent
#[derive(Debug, Clone)]
pub struct ConversionHandler {
    pool: SqlitePool,
}

impl ConversionHandler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply a validated update to one inquiry and return it with relations
    pub async fn update_inquiry_status(
        &self,
        inquiry_id: &str,
        update: InquiryUpdate,
    ) -> Result<InquiryDetails, CrmError> {
        match update.status {
            Some(InquiryStatus::Converted) => self.convert(inquiry_id, update.priority).await,
            _ => self.update_fields(inquiry_id, update).await,
        }
    }

    async fn convert(&self, inquiry_id: &str, priority: Option<Priority>) -> Result<InquiryDetails, CrmError> {
        tracing::info!("🔄 Converting inquiry {}", inquiry_id);

        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| CrmError::Transaction(e.into()))?;

        let current = load_inquiry_details(&mut tx, inquiry_id)
            .await
            .map_err(CrmError::Transaction)?
            .ok_or_else(|| CrmError::NotFound(format!("Inquiry not found: {}", inquiry_id)))?;

        match current.inquiry.status {
            InquiryStatus::Lost => {
                tracing::warn!("🚫 Inquiry {} is LOST and cannot be converted", inquiry_id);
                return Err(CrmError::Conflict(format!(
                    "Inquiry {} is LOST and cannot move to CONVERTED",
                    inquiry_id
                )));
            }
            InquiryStatus::Converted if priority.map_or(true, |p| p == current.inquiry.priority) => {
                tx.commit().await.map_err(|e| CrmError::Transaction(e.into()))?;
                tracing::info!("↩️ Inquiry {} already converted, nothing to do", inquiry_id);
                return Ok(current);
            }
            _ => {}
        }

        let now = timestamp_now();

        let enrolled = sqlx::query("UPDATE students SET status = ?, updated_at = ? WHERE id = ?")
            .bind(StudentStatus::Enrolled.as_str())
            .bind(&now)
            .bind(&current.student.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CrmError::Transaction(e.into()))?;

        if enrolled.rows_affected() != 1 {
            return Err(CrmError::Transaction(anyhow::anyhow!(
                "Student {} linked to inquiry {} could not be enrolled",
                current.student.id,
                inquiry_id
            )));
        }

        sqlx::query(
            "UPDATE inquiries SET status = ?, priority = COALESCE(?, priority), updated_at = ? WHERE id = ?",
        )
        .bind(InquiryStatus::Converted.as_str())
        .bind(priority.map(|p| p.as_str()))
        .bind(&now)
        .bind(inquiry_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| CrmError::Transaction(e.into()))?;

        let converted = load_inquiry_details(&mut tx, inquiry_id)
            .await
            .map_err(CrmError::Transaction)?
            .ok_or_else(|| CrmError::Transaction(anyhow::anyhow!("Inquiry {} vanished mid-conversion", inquiry_id)))?;

        tx.commit().await.map_err(|e| CrmError::Transaction(e.into()))?;

        tracing::info!(
            "✅ Inquiry {} converted, student {} enrolled",
            inquiry_id,
            converted.student.id
        );
        Ok(converted)
    }

    /// Write the supplied fields and read the row back under the same lock
    async fn update_fields(&self, inquiry_id: &str, update: InquiryUpdate) -> Result<InquiryDetails, CrmError> {
        let status = update.status.map(|s| s.as_str());

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        // A status change may not leave a terminal state; priority-only edits may.
        let result = sqlx::query(
            r#"
            UPDATE inquiries
            SET status = COALESCE(?1, status),
                priority = COALESCE(?2, priority),
                updated_at = ?3
            WHERE id = ?4 AND (?1 IS NULL OR status NOT IN ('CONVERTED', 'LOST'))
            "#,
        )
        .bind(status)
        .bind(update.priority.map(|p| p.as_str()))
        .bind(timestamp_now())
        .bind(inquiry_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let existing = sqlx::query("SELECT status FROM inquiries WHERE id = ?")
                .bind(inquiry_id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match existing {
                None => CrmError::NotFound(format!("Inquiry not found: {}", inquiry_id)),
                Some(row) => {
                    let current: String = row.try_get("status")?;
                    CrmError::Conflict(format!(
                        "Inquiry {} is {} and cannot move to {}",
                        inquiry_id,
                        current,
                        status.unwrap_or("?")
                    ))
                }
            });
        }

        let details = load_inquiry_details(&mut tx, inquiry_id)
            .await?
            .ok_or_else(|| CrmError::NotFound(format!("Inquiry not found: {}", inquiry_id)))?;

        tx.commit().await?;

        tracing::debug!("📝 Updated inquiry {}: {:?}", inquiry_id, update);
        Ok(details)
    }
}
