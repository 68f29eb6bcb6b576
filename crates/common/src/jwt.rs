//! JWT utilities shared across the ticketing services.
//!
//! This module provides the pieces every service needs regardless of
//! whether it can verify signatures:
//! - Size limits for DoS prevention
//! - The user token claim set (`UserClaims`)
//! - Unverified claim decoding for services that delegate signature
//!   checks to the identity service
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Generic error messages prevent information leakage
//! - The `sub` field in `UserClaims` is redacted in Debug output
//! - [`decode_claims_unverified`] does NOT check the signature. Only call it
//!   after the identity service has accepted the token.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::decode_claims_unverified;
//!
//! // The remote validator already accepted `token`
//! let claims = decode_claims_unverified(token)?;
//! if claims.has_role("Admin") {
//!     // ...
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected BEFORE any base64 decoding, JSON
/// parsing or signature verification. A user token with a handful of roles
/// is well under 1KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Generic client-facing message for every token failure.
pub const GENERIC_TOKEN_ERROR: &str = "The access token is invalid or expired";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Payload decoded but does not match the user claim set.
    #[error("The access token is invalid or expired")]
    InvalidClaims,
}

// =============================================================================
// Claims Types
// =============================================================================

/// User token claims issued by the identity service.
///
/// # Fields
///
/// - `sub`: Subject (user id, UUID string)
/// - `roles`: Role names held by the user when the token was issued
/// - `iss` / `aud`: Issuer and audience configured per environment
/// - `iat` / `exp`: Issued-at and expiration (Unix epoch seconds)
///
/// `roles` accepts either a JSON array or a single string on the wire, so
/// tokens carrying exactly one role in scalar form still decode.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (user id) - redacted in Debug output.
    pub sub: String,

    /// Role claims embedded at issuance.
    #[serde(default, deserialize_with = "one_or_many")]
    pub roles: Vec<String>,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("sub", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl UserClaims {
    /// Check whether the token carries a role claim.
    ///
    /// Role names are compared exactly (case-sensitive).
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(role) => vec![role],
        OneOrMany::Many(roles) => roles,
    })
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` if the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Decode the claim set of a JWT without verifying its signature.
///
/// Downstream services call this after the identity service has accepted
/// the token; they hold no signing secret of their own.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the signature, issuer, audience or expiry
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64 or invalid JSON
/// - `InvalidClaims` - JSON payload is not a user claim set
pub fn decode_claims_unverified(token: &str) -> Result<UserClaims, JwtValidationError> {
    check_token_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let payload_part = parts.get(1).ok_or(JwtValidationError::MalformedToken)?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
        JwtValidationError::MalformedToken
    })?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT payload JSON");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_value(payload).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "JWT payload is not a user claim set");
        JwtValidationError::InvalidClaims
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn encode_part(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    fn token_with_payload(payload: &str) -> String {
        let header = encode_part(r#"{"alg":"HS256","typ":"JWT"}"#);
        format!("{header}.{}.signature", encode_part(payload))
    }

    fn sample_claims() -> UserClaims {
        UserClaims {
            sub: "4b6f3a52-2a55-4c55-9c55-7b0d9d3c1a11".to_string(),
            roles: vec!["Admin".to_string(), "User".to_string()],
            iss: "ticketing-identity".to_string(),
            aud: "ticketing".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        }
    }

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_decode_claims_unverified_reads_payload() {
        let json = serde_json::to_string(&sample_claims()).unwrap();
        let token = token_with_payload(&json);

        let claims = decode_claims_unverified(&token).unwrap();
        assert_eq!(claims, sample_claims());
    }

    #[test]
    fn test_decode_claims_accepts_single_role_string() {
        let token = token_with_payload(
            r#"{"sub":"u1","roles":"User","iss":"i","aud":"a","iat":1,"exp":2}"#,
        );

        let claims = decode_claims_unverified(&token).unwrap();
        assert_eq!(claims.roles, vec!["User".to_string()]);
    }

    #[test]
    fn test_decode_claims_missing_roles_is_empty() {
        let token = token_with_payload(r#"{"sub":"u1","iss":"i","aud":"a","iat":1,"exp":2}"#);

        let claims = decode_claims_unverified(&token).unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_decode_claims_wrong_part_count() {
        assert_eq!(
            decode_claims_unverified("only.two"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(
            decode_claims_unverified(""),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_claims_invalid_base64() {
        assert_eq!(
            decode_claims_unverified("header.!!!invalid!!!.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_claims_payload_not_json() {
        let token = format!("header.{}.signature", encode_part("not-json"));
        assert_eq!(
            decode_claims_unverified(&token),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_decode_claims_missing_subject() {
        let token = token_with_payload(r#"{"roles":["User"],"iss":"i","aud":"a","iat":1,"exp":2}"#);
        assert_eq!(
            decode_claims_unverified(&token),
            Err(JwtValidationError::InvalidClaims)
        );
    }

    #[test]
    fn test_decode_claims_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(
            decode_claims_unverified(&oversized),
            Err(JwtValidationError::TokenTooLarge)
        );
    }

    #[test]
    fn test_check_token_size_at_limit() {
        let at_limit = "a".repeat(MAX_JWT_SIZE_BYTES);
        assert!(check_token_size(&at_limit).is_ok());
    }

    #[test]
    fn test_user_claims_debug_redacts_sub() {
        let debug_str = format!("{:?}", sample_claims());

        assert!(!debug_str.contains("4b6f3a52"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("Admin"));
    }

    #[test]
    fn test_has_role_is_exact_match() {
        let claims = sample_claims();

        assert!(claims.has_role("Admin"));
        assert!(claims.has_role("User"));
        assert!(!claims.has_role("admin"));
        assert!(!claims.has_role("Adm"));
    }

    #[test]
    fn test_error_messages_are_generic() {
        for err in [
            JwtValidationError::TokenTooLarge,
            JwtValidationError::MalformedToken,
            JwtValidationError::InvalidClaims,
        ] {
            assert_eq!(err.to_string(), GENERIC_TOKEN_ERROR);
        }
    }
}
