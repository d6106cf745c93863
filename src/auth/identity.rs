/// Caller identity supplied by the upstream authentication layer
///
/// Sessions and token issuance live outside this service. The gateway in
/// front of it forwards the authenticated user id and role as headers, and
/// this extractor turns them into a typed [`Caller`].

use crate::auth::permissions::{Action, PermissionTable, Role};
use crate::error::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

/// Header carrying the authenticated user's identifier
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's organizational role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    /// Consult the permission gate; a denial becomes 403
    pub fn require(&self, permissions: &PermissionTable, action: Action) -> Result<(), ApiError> {
        if permissions.allows(self.role, action) {
            return Ok(());
        }

        tracing::warn!(
            "🚫 Permission denied: user {} ({}) lacks {}",
            self.user_id,
            self.role.as_str(),
            action.as_str()
        );
        Err(ApiError::Forbidden(format!(
            "Role {} is not allowed to {}",
            self.role.as_str(),
            action.as_str()
        )))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("Missing caller identity".to_string()))?
            .to_string();

        let role = header(USER_ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("Missing caller role".to_string()))?
            .parse::<Role>()
            .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

        Ok(Caller { user_id, role })
    }
}
