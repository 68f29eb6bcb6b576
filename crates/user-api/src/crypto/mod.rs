//! Token signing and password hashing.
//!
//! User tokens are HS256 JWTs signed with the shared per-environment secret.
//! Verification checks signature, issuer and audience; expiry is enforced
//! only when `JwtSettings::validate_lifetime` is set.

use crate::config::{JwtSettings, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::ApiError;
use common::jwt::{check_token_size, UserClaims, GENERIC_TOKEN_ERROR};
use common::secret::ExposeSecret;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::instrument;

/// Sign user claims with HS256.
#[instrument(skip_all)]
pub fn sign_user_jwt(claims: &UserClaims, settings: &JwtSettings) -> Result<String, ApiError> {
    let encoding_key = EncodingKey::from_secret(settings.secret.expose_secret().as_bytes());

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key)
        .map_err(|e| ApiError::Crypto(format!("JWT signing operation failed: {e}")))
}

/// Verify a user JWT and extract claims.
///
/// Validates:
/// - Token size (must be <= `MAX_JWT_SIZE_BYTES`)
/// - Signature (HS256 only)
/// - `iss` and `aud` against configured values
/// - `exp` when lifetime validation is enabled
#[instrument(skip_all)]
pub fn verify_user_jwt(token: &str, settings: &JwtSettings) -> Result<UserClaims, ApiError> {
    check_token_size(token).map_err(|_| ApiError::InvalidToken(GENERIC_TOKEN_ERROR.to_string()))?;

    let decoding_key = DecodingKey::from_secret(settings.secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&settings.issuer]);
    validation.set_audience(&[&settings.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation.validate_exp = settings.validate_lifetime;

    let token_data = decode::<UserClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "user_api.crypto", error = %e, "User token verification failed");
        ApiError::InvalidToken(GENERIC_TOKEN_ERROR.to_string())
    })?;

    Ok(token_data.claims)
}

/// Hash a password with bcrypt.
///
/// # Errors
///
/// Returns `ApiError::Crypto` if the cost is outside the accepted range or
/// hashing fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(ApiError::Crypto(format!(
            "Invalid bcrypt cost: {cost} (must be {MIN_BCRYPT_COST}-{MAX_BCRYPT_COST})"
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::Crypto(format!("Password hashing failed: {e}")))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Crypto(format!("Password verification failed: {e}")))
}
