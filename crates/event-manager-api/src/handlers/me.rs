//! Current principal handler.
//!
//! Returns the identity the shared auth handler attached to the request.

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
}

impl From<&Principal> for MeResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            sub: principal.subject().to_string(),
            roles: principal.roles().to_vec(),
            scheme: principal.scheme().to_string(),
        }
    }
}

/// Handler for GET /api/v1/me
///
/// ## Response
///
/// ```json
/// {
///   "sub": "6c1f0a52-8d3e-4b8e-9f8e-0d1c2b3a4f5e",
///   "roles": ["EventManager", "User"],
///   "scheme": "Bearer"
/// }
/// ```
#[instrument(skip_all, name = "event_manager_api.handlers.me")]
pub async fn get_me(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    Json(MeResponse::from(&principal))
}
