use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use thiserror::Error;

/// Default bind address for the identity service.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Minimum length of the HS256 signing secret in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_JWT_LIFETIME_SECONDS: i64 = 3600;

/// Allowed token lifetime range in seconds.
pub const MIN_JWT_LIFETIME_SECONDS: i64 = 60;
pub const MAX_JWT_LIFETIME_SECONDS: i64 = 86_400;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Accepted bcrypt cost range. 4 is the bcrypt minimum and is only meant for
/// tests and local development.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 14;

/// Token signing and verification settings.
///
/// Shared through an `Arc`; the secret is redacted in Debug output.
#[derive(Debug)]
pub struct JwtSettings {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub lifetime_seconds: i64,
    /// When false, `exp` is carried but not enforced on validation.
    pub validate_lifetime: bool,
}

/// Optional bootstrap administrator created at startup.
#[derive(Debug)]
pub struct SeedAdmin {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// PostgreSQL URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    pub jwt: Arc<JwtSettings>,
    pub bcrypt_cost: u32,
    pub seed_admin: Option<Arc<SeedAdmin>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .cloned();

        let secret = SecretString::from(required(vars, "JWT_SECRET")?);
        if secret.expose_secret().len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {MIN_JWT_SECRET_BYTES} bytes, got {}",
                secret.expose_secret().len()
            )));
        }

        let issuer = required(vars, "JWT_ISSUER")?;
        let audience = required(vars, "JWT_AUDIENCE")?;

        let lifetime_seconds = parse_in_range(
            vars,
            "JWT_LIFETIME_SECONDS",
            DEFAULT_JWT_LIFETIME_SECONDS,
            MIN_JWT_LIFETIME_SECONDS..=MAX_JWT_LIFETIME_SECONDS,
        )?;

        let validate_lifetime = match vars.get("JWT_VALIDATE_LIFETIME") {
            None => false,
            Some(value) => parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                name: "JWT_VALIDATE_LIFETIME".to_string(),
                reason: format!("expected true or false, got '{value}'"),
            })?,
        };

        let bcrypt_cost = parse_in_range(
            vars,
            "BCRYPT_COST",
            DEFAULT_BCRYPT_COST,
            MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
        )?;

        let seed_admin = match (vars.get("SEED_ADMIN_EMAIL"), vars.get("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(Arc::new(SeedAdmin {
                email: email.clone(),
                password: SecretString::from(password.clone()),
            })),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "SEED_ADMIN_EMAIL".to_string(),
                    reason: "SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together"
                        .to_string(),
                })
            }
        };

        Ok(Config {
            bind_address,
            database_url,
            jwt: Arc::new(JwtSettings {
                secret,
                issuer,
                audience,
                lifetime_seconds,
                validate_lifetime,
            }),
            bcrypt_cost,
            seed_admin,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_in_range<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value: T = raw.parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("'{raw}' is not a number"),
    })?;

    if !range.contains(&value) {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!(
                "{value} is outside the allowed range {}-{}",
                range.start(),
                range.end()
            ),
        });
    }

    Ok(value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
