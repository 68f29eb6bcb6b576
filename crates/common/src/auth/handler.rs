//! Bearer authentication handler.
//!
//! Turns request headers into an [`AuthOutcome`]:
//!
//! 1. Read `Authorization`; missing header => `MissingCredential`
//! 2. Strip the `Bearer ` prefix
//! 3. Ask the injected validator; refusal or transport failure => failure
//! 4. Decode claims locally (the validator already checked the signature)
//! 5. Build a [`Principal`] tagged with the handler's scheme name
//!
//! The handler never errors or panics; every failure is an outcome. It does
//! not retry and does not cache.

use crate::auth::principal::{Principal, BEARER_SCHEME};
use crate::auth::validator::{TokenValidator, ValidationError};
use crate::jwt::decode_claims_unverified;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Reason a request was left unauthenticated.
///
/// Every variant displays as `"Unauthorized"`; the variant itself is for
/// logs and metrics only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header.
    #[error("Unauthorized")]
    MissingCredential,

    /// Header present but not `Bearer <token>`.
    #[error("Unauthorized")]
    MalformedCredential,

    /// The validator refused the token.
    #[error("Unauthorized")]
    Rejected,

    /// The validator could not be reached.
    #[error("Unauthorized")]
    ValidatorUnavailable,

    /// The validator accepted the token but its payload is not a claim set.
    #[error("Unauthorized")]
    UndecodableClaims,
}

impl AuthFailure {
    /// Bounded label for metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "missing_credential",
            AuthFailure::MalformedCredential => "malformed_credential",
            AuthFailure::Rejected => "rejected",
            AuthFailure::ValidatorUnavailable => "validator_unavailable",
            AuthFailure::UndecodableClaims => "undecodable_claims",
        }
    }

    /// Whether retrying the whole request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthFailure::ValidatorUnavailable)
    }
}

impl From<ValidationError> for AuthFailure {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Rejected { .. } => AuthFailure::Rejected,
            ValidationError::Unavailable(_) => AuthFailure::ValidatorUnavailable,
        }
    }
}

/// Result of authenticating one request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated(Principal),
    Unauthenticated(AuthFailure),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthOutcome::Authenticated(principal) => Some(principal),
            AuthOutcome::Unauthenticated(_) => None,
        }
    }

    /// Bounded label for metrics (`authenticated` or the failure label).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AuthOutcome::Authenticated(_) => "authenticated",
            AuthOutcome::Unauthenticated(failure) => failure.label(),
        }
    }

    /// Convert into a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the `AuthFailure` of an unauthenticated outcome.
    pub fn into_result(self) -> Result<Principal, AuthFailure> {
        match self {
            AuthOutcome::Authenticated(principal) => Ok(principal),
            AuthOutcome::Unauthenticated(failure) => Err(failure),
        }
    }
}

/// Callback invoked with every outcome (used by services to record metrics).
pub type OutcomeObserver = Arc<dyn Fn(&AuthOutcome) + Send + Sync>;

/// Authentication handler parameterized by a token validator.
#[derive(Clone)]
pub struct AuthHandler {
    validator: Arc<dyn TokenValidator>,
    scheme: String,
    observer: Option<OutcomeObserver>,
}

impl fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandler")
            .field("scheme", &self.scheme)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthHandler {
    /// Create a handler using the `Bearer` scheme name.
    #[must_use]
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            scheme: BEARER_SCHEME.to_string(),
            observer: None,
        }
    }

    /// Override the scheme name stamped on principals.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Register an outcome observer.
    #[must_use]
    pub fn with_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authenticate a request from its headers.
    #[instrument(skip_all, name = "common.auth.authenticate")]
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthOutcome {
        let outcome = match self.try_authenticate(headers).await {
            Ok(principal) => AuthOutcome::Authenticated(principal),
            Err(failure) => AuthOutcome::Unauthenticated(failure),
        };

        if let Some(observer) = &self.observer {
            observer(&outcome);
        }

        outcome
    }

    async fn try_authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthFailure> {
        let token = extract_bearer_token(headers)?;

        self.validator.validate(token).await.map_err(|e| {
            if e.is_transient() {
                warn!(target: "common.auth.handler", error = %e, "Token validator unavailable");
            } else {
                debug!(target: "common.auth.handler", error = %e, "Token rejected by validator");
            }
            AuthFailure::from(e)
        })?;

        let claims = decode_claims_unverified(token).map_err(|e| {
            warn!(target: "common.auth.handler", error = ?e, "Validated token has undecodable claims");
            AuthFailure::UndecodableClaims
        })?;

        debug!(
            target: "common.auth.handler",
            scheme = %self.scheme,
            roles = ?claims.roles,
            "Request authenticated"
        );

        Ok(Principal::new(self.scheme.clone(), claims))
    }
}

/// Extract the raw token from `Authorization: Bearer <token>`.
///
/// # Errors
///
/// - `MissingCredential` if the header is absent
/// - `MalformedCredential` if it is not valid text, lacks the `Bearer `
///   prefix, or carries an empty token
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let value = headers.get(AUTHORIZATION).ok_or_else(|| {
        debug!(target: "common.auth.handler", "Missing Authorization header");
        AuthFailure::MissingCredential
    })?;

    let value = value.to_str().map_err(|_| {
        debug!(target: "common.auth.handler", "Authorization header is not visible ASCII");
        AuthFailure::MalformedCredential
    })?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        debug!(target: "common.auth.handler", "Invalid Authorization header format");
        AuthFailure::MalformedCredential
    })?;

    let token = token.trim();
    if token.is_empty() {
        debug!(target: "common.auth.handler", "Empty bearer token");
        return Err(AuthFailure::MalformedCredential);
    }

    Ok(token)
}
