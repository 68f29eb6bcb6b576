//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. Use them for the JWT signing secret, user
//! passwords in request bodies and any other value that must never appear
//! in logs.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that derives
//! `Debug` and holds one is safe to pass to `tracing`. Reading the value
//! requires an explicit `expose_secret()` call.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     email: "alice@example.com".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter2"));
//! assert_eq!(req.password.expose_secret(), "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("signing-secret");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("signing-secret"));
    }

    #[test]
    fn test_deserialize_login_body() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Login {
            email: String,
            password: SecretString,
        }

        let json = r#"{"email": "bob@example.com", "password": "my-secret-value"}"#;
        let login: Login = serde_json::from_str(json).expect("deserialize");

        assert_eq!(login.password.expose_secret(), "my-secret-value");

        let debug = format!("{login:?}");
        assert!(!debug.contains("my-secret-value"));
        assert!(debug.contains("bob@example.com"));
    }
}
