//! Event manager configuration.
//!
//! Loaded from environment variables. The service holds no secrets of its
//! own; token decisions are delegated to the identity service.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default bind address for the event manager API.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default timeout for identity service validation calls.
pub const DEFAULT_VALIDATOR_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the validation timeout.
pub const MAX_VALIDATOR_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the identity service (e.g. `http://user-api:8081`).
    pub identity_service_url: String,

    /// Per-request timeout for token validation calls.
    pub validator_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let identity_service_url = vars
            .get("IDENTITY_SERVICE_URL")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnvVar("IDENTITY_SERVICE_URL".to_string()))?;

        if !identity_service_url.starts_with("http://")
            && !identity_service_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                name: "IDENTITY_SERVICE_URL".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let validator_timeout_seconds = match vars.get("VALIDATOR_TIMEOUT_SECONDS") {
            None => DEFAULT_VALIDATOR_TIMEOUT_SECONDS,
            Some(raw) => {
                let value: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "VALIDATOR_TIMEOUT_SECONDS".to_string(),
                    reason: format!("'{raw}' is not a number"),
                })?;

                if !(1..=MAX_VALIDATOR_TIMEOUT_SECONDS).contains(&value) {
                    return Err(ConfigError::InvalidValue {
                        name: "VALIDATOR_TIMEOUT_SECONDS".to_string(),
                        reason: format!(
                            "{value} is outside the allowed range 1-{MAX_VALIDATOR_TIMEOUT_SECONDS}"
                        ),
                    });
                }
                value
            }
        };

        Ok(Config {
            bind_address,
            identity_service_url,
            validator_timeout: Duration::from_secs(validator_timeout_seconds),
        })
    }
}
