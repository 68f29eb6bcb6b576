//! Token issuance and the role-consistency check.
//!
//! A token is only as good as the roles it carries: validation re-reads the
//! user's live role set and refuses any token embedding a role the user no
//! longer holds, even if the signature is intact.

use crate::config::JwtSettings;
use crate::crypto;
use crate::errors::ApiError;
use crate::models::{TokenResponse, User};
use crate::observability::metrics::{record_token_issuance, record_token_validation};
use crate::repositories::UserRepository;
use common::auth::BEARER_SCHEME;
use common::jwt::UserClaims;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

/// Dummy bcrypt hash verified when the email is unknown, so lookups for
/// missing and existing accounts take comparable time.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Why the role-consistency check refused a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheckFailure {
    /// Size, signature, issuer, audience, lifetime or claim shape.
    Signature,
    /// `sub` is not a UUID or names no user.
    UnknownUser,
    InactiveUser,
    /// The token embeds a role the user no longer holds.
    RoleDrift,
    /// The user store could not be read.
    Store,
}

impl TokenCheckFailure {
    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TokenCheckFailure::Signature => "signature",
            TokenCheckFailure::UnknownUser => "unknown_user",
            TokenCheckFailure::InactiveUser => "inactive_user",
            TokenCheckFailure::RoleDrift => "role_drift",
            TokenCheckFailure::Store => "store",
        }
    }
}

impl fmt::Display for TokenCheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Issues user tokens and validates them against the live user store.
#[derive(Clone)]
pub struct TokenService {
    users: Arc<dyn UserRepository>,
    settings: Arc<JwtSettings>,
}

impl TokenService {
    pub fn new(users: Arc<dyn UserRepository>, settings: Arc<JwtSettings>) -> Self {
        Self { users, settings }
    }

    /// Build and sign a token for `user` embedding `roles`.
    #[instrument(skip_all)]
    pub fn issue_for_user(&self, user: &User, roles: Vec<String>) -> Result<TokenResponse, ApiError> {
        let now = chrono::Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.user_id.to_string(),
            roles,
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now,
            exp: now + self.settings.lifetime_seconds,
        };

        let access_token = crypto::sign_user_jwt(&claims, &self.settings)?;

        Ok(TokenResponse {
            access_token,
            token_type: BEARER_SCHEME.to_string(),
            expires_in: u64::try_from(self.settings.lifetime_seconds).unwrap_or_default(),
            roles: claims.roles,
        })
    }

    /// Authenticate with email and password and issue a token carrying the
    /// user's live roles.
    ///
    /// Unknown email, wrong password and inactive user all produce
    /// `ApiError::InvalidCredentials`.
    #[instrument(skip_all, name = "user_api.token.issue")]
    pub async fn issue_user_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, ApiError> {
        let start = Instant::now();
        let result = self.authenticate_and_issue(email, password).await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());

        result
    }

    async fn authenticate_and_issue(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, ApiError> {
        let email = normalize_email(email);
        let user = self.users.get_by_email(&email).await?;

        // Always run bcrypt, even for unknown emails
        let hash_to_verify = user
            .as_ref()
            .map_or(DUMMY_PASSWORD_HASH, |u| u.password_hash.as_str());
        let password_ok = crypto::verify_password(password, hash_to_verify)?;

        let user = match user {
            Some(user) if password_ok && user.is_active => user,
            Some(user) if password_ok => {
                tracing::debug!(target: "user_api.token", user_id = %user.user_id, "Token refused: user inactive");
                return Err(ApiError::InvalidCredentials);
            }
            _ => {
                tracing::debug!(target: "user_api.token", "Token refused: invalid credentials");
                return Err(ApiError::InvalidCredentials);
            }
        };

        let roles = self.users.get_user_roles(user.user_id).await?;
        let response = self.issue_for_user(&user, roles)?;

        tracing::info!(
            target: "user_api.token",
            user_id = %user.user_id,
            roles = ?response.roles,
            "User token issued"
        );

        Ok(response)
    }

    /// Run the full check and return the claims or the failure reason.
    #[instrument(skip_all, name = "user_api.token.check")]
    pub async fn check_token(&self, token: &str) -> Result<UserClaims, TokenCheckFailure> {
        let result = self.check_token_inner(token).await;

        match &result {
            Ok(_) => record_token_validation("success", "none"),
            Err(failure) => {
                tracing::debug!(target: "user_api.token", reason = %failure, "Token validation failed");
                record_token_validation("error", failure.label());
            }
        }

        result
    }

    async fn check_token_inner(&self, token: &str) -> Result<UserClaims, TokenCheckFailure> {
        let claims = crypto::verify_user_jwt(token, &self.settings)
            .map_err(|_| TokenCheckFailure::Signature)?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| TokenCheckFailure::UnknownUser)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await
            .map_err(|_| TokenCheckFailure::Store)?
            .ok_or(TokenCheckFailure::UnknownUser)?;

        if !user.is_active {
            return Err(TokenCheckFailure::InactiveUser);
        }

        let live_roles = self
            .users
            .get_user_roles(user_id)
            .await
            .map_err(|_| TokenCheckFailure::Store)?;

        if let Some(stale) = first_stale_role(&claims.roles, &live_roles) {
            tracing::debug!(
                target: "user_api.token",
                user_id = %user_id,
                stale_role = %stale,
                "Token embeds a role the user no longer holds"
            );
            return Err(TokenCheckFailure::RoleDrift);
        }

        Ok(claims)
    }

    /// Whether `token` is currently valid. Every failure is `false`.
    pub async fn validate_token(&self, token: &str) -> bool {
        self.check_token(token).await.is_ok()
    }
}

/// First embedded role missing from the live set (exact, case-sensitive).
fn first_stale_role<'a>(embedded: &'a [String], live: &[String]) -> Option<&'a str> {
    let live: HashSet<&str> = live.iter().map(String::as_str).collect();
    embedded
        .iter()
        .map(String::as_str)
        .find(|role| !live.contains(role))
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
