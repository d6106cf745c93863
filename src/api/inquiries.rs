/// Inquiry pipeline REST endpoints
///
/// PATCH /api/inquiries/{id} is the entry point for status changes. A move to
/// CONVERTED goes through the conversion handler, which enrolls the linked
/// student atomically.

use crate::api::{crm_failure, parse_filter, ApiJson, AppState};
use crate::auth::{Action, Caller};
use crate::crm::types::{InquiryDetails, InquiryStats, InquiryStatus, InquiryUpdate, NewInquiry};
use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for status/priority updates
#[derive(Debug, Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InquiryFilter {
    pub status: Option<String>,
}

pub fn create_inquiry_routes() -> Router<AppState> {
    Router::new()
        .route("/api/inquiries", get(list_inquiries).post(create_inquiry))
        .route("/api/inquiries/stats", get(inquiry_stats))
        .route("/api/inquiries/{id}", get(get_inquiry).patch(update_inquiry))
}

/// GET /api/inquiries?status=QUALIFIED
async fn list_inquiries(
    State(state): State<AppState>,
    caller: Caller,
    Query(filter): Query<InquiryFilter>,
) -> Result<Json<Value>, ApiError> {
    caller.require(&state.permissions, Action::ViewInquiries)?;
    let status = parse_filter::<InquiryStatus>(filter.status.as_deref())?;

    let inquiries = state.storage.list_inquiries(status).await.map_err(|e| {
        tracing::error!("Failed to list inquiries: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(json!({ "inquiries": inquiries })))
}

/// GET /api/inquiries/stats
async fn inquiry_stats(State(state): State<AppState>, caller: Caller) -> Result<Json<InquiryStats>, ApiError> {
    caller.require(&state.permissions, Action::ViewInquiries)?;

    let stats = state.storage.inquiry_stats().await.map_err(|e| {
        tracing::error!("Failed to compute inquiry stats: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(stats))
}

/// POST /api/inquiries
/// Body: { "student_id": "...", "course_interest": "...", "source": "...", "priority": "HIGH" }
async fn create_inquiry(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<NewInquiry>,
) -> Result<(StatusCode, Json<InquiryDetails>), ApiError> {
    caller.require(&state.permissions, Action::CreateStudents)?;

    let details = state
        .storage
        .create_inquiry(payload)
        .await
        .map_err(|e| crm_failure("Create inquiry", e))?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// GET /api/inquiries/{id}
async fn get_inquiry(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<InquiryDetails>, ApiError> {
    caller.require(&state.permissions, Action::ViewInquiries)?;

    match state.storage.get_inquiry_details(&id).await {
        Ok(Some(details)) => Ok(Json(details)),
        Ok(None) => Err(ApiError::NotFound(format!("Inquiry not found: {}", id))),
        Err(e) => {
            tracing::error!("Failed to get inquiry {}: {}", id, e);
            Err(e.into())
        }
    }
}

/// Update an inquiry's status and/or priority
///
/// PATCH /api/inquiries/{id}
/// Body: { "status": "CONVERTED" } or { "status": "FOLLOW_UP", "priority": "HIGH" }
/// Returns the inquiry with its student and center attached.
async fn update_inquiry(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateInquiryRequest>,
) -> Result<Json<InquiryDetails>, ApiError> {
    caller.require(&state.permissions, Action::CreateStudents)?;

    let update = InquiryUpdate::parse(payload.status.as_deref(), payload.priority.as_deref())?;

    tracing::info!("📥 Inquiry update by {}: {} -> {:?}", caller.user_id, id, update);

    let details = state
        .conversions
        .update_inquiry_status(&id, update)
        .await
        .map_err(|e| crm_failure("Inquiry update", e))?;
    Ok(Json(details))
}
