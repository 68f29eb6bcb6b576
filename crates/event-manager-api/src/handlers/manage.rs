//! Event management access check.
//!
//! Mounted behind `require_any_role` for [`MANAGER_ROLES`]; the handler
//! re-derives which of the caller's roles grant access.

use crate::errors::ApiError;
use axum::{Extension, Json};
use common::auth::Principal;
use serde::Serialize;
use tracing::instrument;

/// Roles allowed to manage events.
pub const MANAGER_ROLES: [&str; 2] = ["EventManager", "Admin"];

/// Response for `/api/v1/manage/access`.
#[derive(Debug, Clone, Serialize)]
pub struct ManageAccessResponse {
    pub sub: String,

    /// Caller roles that grant management access.
    pub granted_by: Vec<String>,
}

/// Handler for GET /api/v1/manage/access
///
/// Returns 401 if no principal was attached and 403 if the principal holds
/// none of [`MANAGER_ROLES`].
#[instrument(skip_all, name = "event_manager_api.handlers.manage_access")]
pub async fn get_access(
    principal: Option<Extension<Principal>>,
) -> Result<Json<ManageAccessResponse>, ApiError> {
    let Some(Extension(principal)) = principal else {
        return Err(ApiError::InvalidToken("Unauthorized".to_string()));
    };

    let granted_by: Vec<String> = principal
        .roles()
        .iter()
        .filter(|role| MANAGER_ROLES.contains(&role.as_str()))
        .cloned()
        .collect();

    if granted_by.is_empty() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    tracing::debug!(
        target: "event_manager_api.handlers.manage",
        granted_by = ?granted_by,
        "Management access granted"
    );

    Ok(Json(ManageAccessResponse {
        sub: principal.subject().to_string(),
        granted_by,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::jwt::UserClaims;

    fn principal(roles: &[&str]) -> Principal {
        Principal::new(
            "Bearer",
            UserClaims {
                sub: "user-1".to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
                iss: "ticketing-identity".to_string(),
                aud: "ticketing".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_003_600,
            },
        )
    }

    #[tokio::test]
    async fn test_manager_roles_are_reported() {
        let Json(response) = get_access(Some(Extension(principal(&[
            "Admin",
            "EventManager",
            "User",
        ]))))
        .await
        .unwrap();

        assert_eq!(response.sub, "user-1");
        assert_eq!(
            response.granted_by,
            vec!["Admin".to_string(), "EventManager".to_string()]
        );
    }

    #[tokio::test]
    async fn test_plain_user_is_forbidden() {
        let result = get_access(Some(Extension(principal(&["User", "VenueManager"])))).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_role_match_is_case_sensitive() {
        let result = get_access(Some(Extension(principal(&["eventmanager"])))).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_missing_principal_is_unauthorized() {
        let result = get_access(None).await;
        assert!(matches!(result, Err(ApiError::InvalidToken(_))));
    }
}
