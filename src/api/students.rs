/// Center and student REST endpoints

use crate::api::{crm_failure, parse_filter, ApiJson, AppState};
use crate::auth::{Action, Caller};
use crate::crm::types::{Center, NewCenter, NewStudent, Student, StudentStatus};
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

#[derive(Debug, Deserialize)]
pub struct StudentFilter {
    pub status: Option<String>,
}

pub fn create_student_routes() -> Router<AppState> {
    Router::new()
        .route("/api/centers", get(list_centers).post(create_center))
        .route("/api/students", get(list_students).post(create_student))
        .route("/api/students/{id}", get(get_student))
}

/// GET /api/centers
async fn list_centers(State(state): State<AppState>, caller: Caller) -> Result<Json<Value>, ApiError> {
    caller.require(&state.permissions, Action::ViewStudents)?;

    let centers = state.storage.list_centers().await.map_err(|e| {
        tracing::error!("Failed to list centers: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(json!({ "centers": centers })))
}

/// POST /api/centers
/// Body: { "name": "...", "code": "...", "city": "..." }
async fn create_center(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<NewCenter>,
) -> Result<(StatusCode, Json<Center>), ApiError> {
    caller.require(&state.permissions, Action::ManageUsers)?;

    let center = state
        .storage
        .create_center(payload)
        .await
        .map_err(|e| crm_failure("Create center", e))?;
    Ok((StatusCode::CREATED, Json(center)))
}

/// GET /api/students?status=ENROLLED
async fn list_students(
    State(state): State<AppState>,
    caller: Caller,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<Value>, ApiError> {
    caller.require(&state.permissions, Action::ViewStudents)?;
    let status = parse_filter::<StudentStatus>(filter.status.as_deref())?;

    let students = state.storage.list_students(status).await.map_err(|e| {
        tracing::error!("Failed to list students: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(json!({ "students": students })))
}

/// POST /api/students
/// Body: { "center_id": "...", "first_name": "...", "last_name": "...", "email": "..." }
async fn create_student(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(payload): ApiJson<NewStudent>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    caller.require(&state.permissions, Action::CreateStudents)?;

    let student = state
        .storage
        .create_student(payload)
        .await
        .map_err(|e| crm_failure("Create student", e))?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/{id}
async fn get_student(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    caller.require(&state.permissions, Action::ViewStudents)?;

    match state.storage.get_student(&id).await {
        Ok(Some(student)) => Ok(Json(student)),
        Ok(None) => Err(ApiError::NotFound(format!("Student not found: {}", id))),
        Err(e) => {
            tracing::error!("Failed to get student {}: {}", id, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::test_support::{seed_pipeline, test_pool};
    use crate::{api::AppState, auth::PermissionTable, crm::{ConversionHandler, CrmStorage}};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> axum::Router {
        let pool = test_pool().await;
        let storage = CrmStorage::new(pool.clone());
        seed_pipeline(&storage).await;
        build_router(AppState {
            storage,
            conversions: ConversionHandler::new(pool),
            permissions: Arc::new(PermissionTable::standard()),
        })
    }

    fn post_student(role: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/students")
            .header("content-type", "application/json")
            .header("x-user-id", "u-1")
            .header("x-user-role", role)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn counselor_registers_student_in_inquiry_state() {
        let app = app().await;
        let body = serde_json::json!({
            "center_id": "CTR-001",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "Grace@Example.com"
        });

        let response = app.oneshot(post_student("COUNSELOR", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let student: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(student["status"], "INQUIRY");
        assert_eq!(student["email"], "grace@example.com");
        assert!(student["id"].as_str().unwrap().starts_with("STU-"));
    }

    #[tokio::test]
    async fn unknown_center_is_a_validation_error() {
        let app = app().await;
        let body = serde_json::json!({
            "center_id": "CTR-999",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com"
        });

        let response = app.oneshot(post_student("ADMIN", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_student_id_conflicts() {
        let app = app().await;
        let body = serde_json::json!({
            "id": "STU-001",
            "center_id": "CTR-001",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com"
        });

        let response = app.oneshot(post_student("ADMIN", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn faculty_cannot_register_students() {
        let app = app().await;
        let body = serde_json::json!({
            "center_id": "CTR-001",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com"
        });

        let response = app.clone().oneshot(post_student("FACULTY", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/students")
                    .header("x-user-id", "u-1")
                    .header("x-user-role", "FACULTY")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["students"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn student_filter_rejects_unknown_status() {
        let app = app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/students?status=GRADUATED")
                    .header("x-user-id", "u-1")
                    .header("x-user-role", "STAFF")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
