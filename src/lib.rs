/// centerdesk: admissions and enrollment back end for vocational training centers
///
/// Provides the permission gate, the inquiry pipeline and the atomic
/// inquiry-to-student conversion behind a JSON HTTP API.

// Core configuration and setup
pub mod config;

// Permission gate and caller identity
pub mod auth;

// HTTP error taxonomy
pub mod error;

// SQLite connection setup
pub mod database;

// Centers, students, inquiries and the conversion handler
pub mod crm;

// HTTP API layer - REST endpoints for the CRM
pub mod api;

// Server setup and initialization
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for external consumers
pub use auth::{Action, PermissionTable, Role};
pub use crm::{ConversionHandler, CrmStorage, InquiryDetails, InquiryStatus, StudentStatus};
pub use error::ApiError;
pub use server::start_server;
