/// Caller introspection endpoint

use crate::api::AppState;
use crate::auth::{Action, Caller, Role};
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub user_id: String,
    pub role: Role,
    pub actions: Vec<Action>,
}

pub fn create_session_routes() -> Router<AppState> {
    Router::new().route("/api/me/permissions", get(my_permissions))
}

/// GET /api/me/permissions
async fn my_permissions(State(state): State<AppState>, caller: Caller) -> Json<PermissionsResponse> {
    let actions = state.permissions.grants(caller.role).collect();
    Json(PermissionsResponse {
        user_id: caller.user_id,
        role: caller.role,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::test_support::test_pool;
    use crate::{api::AppState, auth::PermissionTable, crm::{ConversionHandler, CrmStorage}};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn lists_grants_for_caller_role() {
        let pool = test_pool().await;
        let app = build_router(AppState {
            storage: CrmStorage::new(pool.clone()),
            conversions: ConversionHandler::new(pool),
            permissions: Arc::new(PermissionTable::standard()),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/me/permissions")
                    .header("x-user-id", "u-3")
                    .header("x-user-role", "faculty")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["role"], "FACULTY");
        assert_eq!(body["actions"], serde_json::json!(["view_students"]));
    }
}
