//! Bearer token authentication shared by every service.
//!
//! Each service builds one [`AuthHandler`] around an injected
//! [`TokenValidator`] and mounts [`require_auth`] on its protected routes.
//! Downstream services inject a [`RemoteTokenValidator`] that asks the
//! identity service whether a token is still valid; the identity service
//! injects its own in-process validator.
//!
//! # Components
//!
//! - `handler` - Header parsing, validator delegation, principal building
//! - `principal` - Per-request identity built from decoded claims
//! - `validator` - `TokenValidator` trait and tagged validation errors
//! - `remote` - HTTP validator calling `GET .../validate?token=`
//! - `middleware` - axum middleware and 401/403 responses
//! - `mock` - Mock validator for tests (`test-utils` feature)
//!
//! # Flow
//!
//! ```text
//! Authorization header -> strip "Bearer " -> validator.validate(token)
//!     -> decode claims locally -> Principal in request extensions
//! ```
//!
//! No validation result is cached: every request performs one validator call.

pub mod handler;
pub mod middleware;
pub mod principal;
pub mod remote;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use handler::{extract_bearer_token, AuthFailure, AuthHandler, AuthOutcome, OutcomeObserver};
pub use middleware::{require_any_role, require_auth, AuthError, PrincipalExt, RequiredRoles};
pub use principal::{Principal, BEARER_SCHEME};
pub use remote::RemoteTokenValidator;
pub use validator::{TokenValidator, ValidationError};
