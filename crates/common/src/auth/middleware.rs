//! axum middleware for protected routes.
//!
//! `require_auth` runs the [`AuthHandler`] and stores the resulting
//! [`Principal`] in request extensions. `require_any_role` must be layered
//! inside it and rejects principals lacking every required role.

use crate::auth::handler::{AuthFailure, AuthHandler, AuthOutcome};
use crate::auth::principal::Principal;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// `WWW-Authenticate` challenge sent with every 401.
pub const WWW_AUTHENTICATE_CHALLENGE: &str = r#"Bearer realm="ticketing", error="invalid_token""#;

/// Rejection produced by the auth middleware.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthenticated(AuthFailure),

    #[error("Insufficient permissions")]
    Forbidden {
        /// Roles of which at least one was required.
        required: Vec<String>,
    },
}

impl From<AuthFailure> for AuthError {
    fn from(failure: AuthFailure) -> Self {
        AuthError::Unauthenticated(failure)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        });

        let mut response = (status, body).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static(WWW_AUTHENTICATE_CHALLENGE),
            );
        }

        response
    }
}

/// Authenticate the request and store the [`Principal`] in extensions.
///
/// # Response
///
/// - 401 with `WWW-Authenticate` when the outcome is unauthenticated
/// - Otherwise continues to the next handler
#[instrument(skip_all, name = "common.middleware.auth")]
pub async fn require_auth(
    State(handler): State<Arc<AuthHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match handler.authenticate(req.headers()).await {
        AuthOutcome::Authenticated(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        AuthOutcome::Unauthenticated(failure) => Err(failure.into()),
    }
}

/// Role set for [`require_any_role`].
#[derive(Debug, Clone)]
pub struct RequiredRoles(Arc<Vec<String>>);

impl RequiredRoles {
    /// Require at least one of `roles`.
    #[must_use]
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(roles.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.0
    }
}

/// Reject authenticated principals holding none of the required roles.
///
/// A request without a principal (middleware ordering mistake) is treated
/// as unauthenticated.
#[instrument(skip_all, name = "common.middleware.roles")]
pub async fn require_any_role(
    State(required): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(principal) = req.principal() else {
        tracing::warn!(target: "common.middleware.roles", "Role check ran without a principal");
        return Err(AuthError::Unauthenticated(AuthFailure::MissingCredential));
    };

    if !principal.has_any_role(required.roles()) {
        tracing::debug!(
            target: "common.middleware.roles",
            required = ?required.roles(),
            held = ?principal.roles(),
            "Principal lacks required role"
        );
        return Err(AuthError::Forbidden {
            required: required.roles().to_vec(),
        });
    }

    Ok(next.run(req).await)
}

/// Access the authenticated principal from a request.
pub trait PrincipalExt {
    /// `None` if the auth middleware did not run for this request.
    fn principal(&self) -> Option<&Principal>;
}

impl<B> PrincipalExt for axum::http::Request<B> {
    fn principal(&self) -> Option<&Principal> {
        self.extensions().get::<Principal>()
    }
}
