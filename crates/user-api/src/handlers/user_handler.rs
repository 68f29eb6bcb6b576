//! Self-service registration.

use crate::errors::ApiError;
use crate::models::UserResponse;
use crate::routes::AppState;
use crate::services::user_service::{self, RegistrationRequest};
use axum::{extract::State, http::StatusCode, Json};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    pub display_name: String,
}

/// Handle user registration
///
/// POST /api/v1/users/register
#[instrument(skip_all, name = "user_api.handlers.register")]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let response = user_service::register_user(
        state.users.as_ref(),
        state.config.bcrypt_cost,
        RegistrationRequest {
            email: payload.email,
            password: payload.password.expose_secret().to_string(),
            display_name: payload.display_name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
