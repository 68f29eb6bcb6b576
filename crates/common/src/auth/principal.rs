//! Authenticated principal.
//!
//! Built per request from decoded token claims and stored in request
//! extensions by the auth middleware. Never persisted.

use crate::jwt::UserClaims;
use std::fmt;

/// Scheme name used by the default authentication handler.
pub const BEARER_SCHEME: &str = "Bearer";

/// Identity and role context of an authenticated request.
///
/// The subject is redacted in Debug output.
#[derive(Clone)]
pub struct Principal {
    scheme: String,
    claims: UserClaims,
}

impl Principal {
    /// Build a principal from decoded claims, tagged with the scheme that
    /// authenticated it.
    #[must_use]
    pub fn new(scheme: impl Into<String>, claims: UserClaims) -> Self {
        Self {
            scheme: scheme.into(),
            claims,
        }
    }

    /// Subject (user id) from the token.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// Role claims from the token.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.claims.roles
    }

    /// Authentication scheme name.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Full decoded claim set.
    #[must_use]
    pub fn claims(&self) -> &UserClaims {
        &self.claims
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.has_role(role)
    }

    /// True if the principal holds at least one of `roles`.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("scheme", &self.scheme)
            .field("subject", &"[REDACTED]")
            .field("roles", &self.claims.roles)
            .finish()
    }
}
