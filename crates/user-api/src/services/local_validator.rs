//! In-process token validator for the identity service's own routes.
//!
//! Plugs the role-consistency check into the shared `AuthHandler` without
//! an HTTP round trip.

use crate::services::token_service::{TokenCheckFailure, TokenService};
use async_trait::async_trait;
use common::auth::{TokenValidator, ValidationError};

#[derive(Clone)]
pub struct LocalTokenValidator {
    tokens: TokenService,
}

impl LocalTokenValidator {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenValidator for LocalTokenValidator {
    async fn validate(&self, token: &str) -> Result<(), ValidationError> {
        match self.tokens.check_token(token).await {
            Ok(_) => Ok(()),
            Err(TokenCheckFailure::Store) => Err(ValidationError::Unavailable(
                "user store unavailable".to_string(),
            )),
            Err(_) => Err(ValidationError::Rejected { status: 401 }),
        }
    }
}
