//! Current principal handler.

use axum::{Extension, Json};
use common::auth::Principal;
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject (user id).
    pub sub: String,

    /// Role claims carried by the token.
    pub roles: Vec<String>,

    /// Authentication scheme that produced the principal.
    pub scheme: String,

    pub iat: i64,
    pub exp: i64,
}

/// Handler for GET /api/v1/me
#[instrument(skip_all, name = "user_api.handlers.me")]
pub async fn get_me(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    let claims = principal.claims();

    Json(MeResponse {
        sub: principal.subject().to_string(),
        roles: principal.roles().to_vec(),
        scheme: principal.scheme().to_string(),
        iat: claims.iat,
        exp: claims.exp,
    })
}
