//! Token issuance and validation endpoints.

use crate::errors::ApiError;
use crate::models::TokenResponse;
use crate::routes::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// Handle user token request
///
/// POST /api/v1/auth/token
#[instrument(skip_all, name = "user_api.handlers.issue_token")]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .tokens
        .issue_user_token(&payload.email, payload.password.expose_secret())
        .await?;

    Ok(Json(token))
}

/// Validate a token for downstream services
///
/// GET /api/v1/auth/validate?token=...
///
/// 200 `{"valid":true}` when the signature, issuer, audience and role set
/// all check out; 401 otherwise, including a missing `token` parameter.
#[instrument(skip_all, name = "user_api.handlers.validate_token")]
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let token = params.token.unwrap_or_default();

    if state.tokens.validate_token(&token).await {
        Ok(Json(ValidateResponse { valid: true }))
    } else {
        Err(ApiError::InvalidToken("Unauthorized".to_string()))
    }
}
