//! Role administration endpoints (`Admin` only).
//!
//! Revoking a role takes effect on the next validation of any outstanding
//! token; no reissue is required.

use crate::errors::ApiError;
use crate::models::{UserResponse, UserRolesResponse};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use common::auth::Principal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

/// GET /api/v1/admin/users/:id/roles
#[instrument(skip_all, name = "user_api.handlers.admin.list_roles")]
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(
        user_service::get_roles(state.users.as_ref(), user_id).await?,
    ))
}

/// POST /api/v1/admin/users/:id/roles
#[instrument(skip_all, name = "user_api.handlers.admin.add_role")]
pub async fn add_role(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(
        user_service::add_role(state.users.as_ref(), user_id, &payload.role).await?,
    ))
}

/// DELETE /api/v1/admin/users/:id/roles/:role
#[instrument(skip_all, name = "user_api.handlers.admin.remove_role")]
pub async fn remove_role(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((user_id, role)): Path<(String, String)>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(
        user_service::remove_role(state.users.as_ref(), principal.subject(), user_id, &role)
            .await?,
    ))
}

/// PUT /api/v1/admin/users/:id/active
#[instrument(skip_all, name = "user_api.handlers.admin.set_active")]
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<ActiveRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(
        user_service::set_active(
            state.users.as_ref(),
            principal.subject(),
            user_id,
            payload.is_active,
        )
        .await?,
    ))
}

/// Parse the `:id` path segment. A malformed id is a 400 with the JSON
/// error body instead of axum's plain-text rejection.
fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid user id".to_string()))
}
