/// Admissions CRM
///
/// Centers, students and the inquiry pipeline, including the conversion
/// that turns a qualified inquiry into an enrolled student.

// Record and request types
pub mod types;

// SQLite persistence
pub mod storage;

// Status updates and the atomic inquiry -> student conversion
pub mod conversion;

use thiserror::Error;

pub use conversion::ConversionHandler;
pub use storage::CrmStorage;
pub use types::{Center, Inquiry, InquiryDetails, InquiryStatus, InquiryUpdate, Priority, Student, StudentStatus};

/// Failures of CRM operations
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A multi-entity write failed; nothing was committed
    #[error("transaction rolled back: {0}")]
    Transaction(anyhow::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
