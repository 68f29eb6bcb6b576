//! Token validator abstraction.
//!
//! The authentication handler never verifies signatures itself; it asks a
//! `TokenValidator` whether a token is acceptable. Failures are tagged so
//! callers can tell an unreachable identity service apart from a rejected
//! credential, even though both end up as "Unauthorized" at the HTTP edge.

use async_trait::async_trait;
use thiserror::Error;

/// Why a token did not validate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The identity service answered and refused the token (4xx or other
    /// non-success, non-5xx status).
    #[error("Token rejected (status {status})")]
    Rejected {
        /// HTTP status returned by the identity service.
        status: u16,
    },

    /// The identity service could not be asked: transport error, timeout
    /// or 5xx response.
    #[error("Token validator unavailable: {0}")]
    Unavailable(String),
}

impl ValidationError {
    /// Whether the failure is an infrastructure problem rather than a
    /// credential decision. Only these are worth retrying at the caller.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ValidationError::Unavailable(_))
    }
}

/// Decides whether a raw bearer token is currently valid.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate the raw token (without the `Bearer ` prefix).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Rejected` when the token is refused and
    /// `ValidationError::Unavailable` when no decision could be obtained.
    async fn validate(&self, token: &str) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_transient() {
        assert!(ValidationError::Unavailable("connection refused".to_string()).is_transient());
    }

    #[test]
    fn test_rejected_is_not_transient() {
        assert!(!ValidationError::Rejected { status: 401 }.is_transient());
    }

    #[test]
    fn test_display_includes_status() {
        let err = ValidationError::Rejected { status: 403 };
        assert_eq!(err.to_string(), "Token rejected (status 403)");
    }
}
