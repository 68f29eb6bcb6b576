//! HTTP token validator backed by the identity service.
//!
//! Sends `GET {base}/api/v1/auth/validate?token=<token>` and treats any 2xx
//! answer as valid.
//!
//! # Security
//!
//! - The token travels in the query string, so reqwest errors are stripped
//!   of their URL before being logged
//! - HTTPS should be used in production (enforced by deployment config)
//! - Timeouts bound how long a hung identity service can stall a request
//!
//! There is no cache and no retry: each call is one HTTP round trip.

use crate::auth::validator::{TokenValidator, ValidationError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Path of the identity service validation endpoint.
pub const VALIDATE_PATH: &str = "/api/v1/auth/validate";

/// Default request timeout for validation calls.
pub const DEFAULT_VALIDATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for validation calls.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Validator that delegates every decision to the identity service.
#[derive(Clone, Debug)]
pub struct RemoteTokenValidator {
    http_client: Client,
    validate_url: String,
}

impl RemoteTokenValidator {
    /// Create a validator for the identity service at `base_url`
    /// (e.g. `http://localhost:8081`).
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            // A 3xx is an answer, not a hop to another host
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http_client,
            validate_url: format!("{}{VALIDATE_PATH}", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL of the validation endpoint (without query).
    #[must_use]
    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }
}

#[async_trait]
impl TokenValidator for RemoteTokenValidator {
    #[instrument(skip_all, name = "common.auth.remote.validate")]
    async fn validate(&self, token: &str) -> Result<(), ValidationError> {
        let response = self
            .http_client
            .get(&self.validate_url)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(
                    target: "common.auth.remote",
                    error = %e,
                    timeout = e.is_timeout(),
                    "Token validation request failed"
                );
                ValidationError::Unavailable("identity service unreachable".to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            debug!(target: "common.auth.remote", status = %status, "Token accepted by identity service");
            Ok(())
        } else if status.is_server_error() {
            warn!(target: "common.auth.remote", status = %status, "Identity service returned server error");
            Err(ValidationError::Unavailable(format!(
                "identity service returned {}",
                status.as_u16()
            )))
        } else {
            debug!(target: "common.auth.remote", status = %status, "Token rejected by identity service");
            Err(ValidationError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
