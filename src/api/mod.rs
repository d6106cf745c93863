/// HTTP API Layer
///
/// Thin JSON endpoints over the CRM. Every handler resolves the caller,
/// consults the permission gate, then calls into storage or the conversion
/// handler:
/// - Centers and students
/// - Inquiry pipeline, including status updates and conversion
/// - Caller permission introspection

use crate::auth::PermissionTable;
use crate::crm::{ConversionHandler, CrmError, CrmStorage};
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use std::sync::Arc;

// Center and student endpoints
pub mod students;

// Inquiry pipeline endpoints
pub mod inquiries;

// Caller introspection
pub mod session;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// CRM persistence
    pub storage: CrmStorage,
    /// Inquiry updates and conversions
    pub conversions: ConversionHandler,
    /// Permission gate, loaded once at startup
    pub permissions: Arc<PermissionTable>,
}

/// JSON body extractor whose rejections use the API error body
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("⚠️ Rejected request body: {}", rejection.body_text());
            ApiError::from(rejection)
        })?;
        Ok(ApiJson(value))
    }
}

/// Convert a CRM failure for the response, logging the ones that are not the caller's fault
pub(crate) fn crm_failure(context: &str, err: CrmError) -> ApiError {
    match &err {
        CrmError::Transaction(_) | CrmError::Storage(_) | CrmError::Database(_) => {
            tracing::error!("❌ {} failed: {}", context, err);
        }
        _ => tracing::debug!("⚠️ {} rejected: {}", context, err),
    }
    err.into()
}

/// Parse an optional `?status=` filter
pub(crate) fn parse_filter<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr<Err = CrmError>,
{
    raw.filter(|value| !value.is_empty())
        .map(str::parse)
        .transpose()
        .map_err(ApiError::from)
}

pub use inquiries::create_inquiry_routes;
pub use session::create_session_routes;
pub use students::create_student_routes;
