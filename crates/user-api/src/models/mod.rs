use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User model (maps to users table)
#[derive(Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields needed to insert a user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

/// Platform role names.
///
/// Stored and embedded in tokens by their exact (case-sensitive) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
    EventManager,
    VenueManager,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::User, Role::EventManager, Role::VenueManager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::EventManager => "EventManager",
            Role::VenueManager => "VenueManager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

/// Token response returned by `POST /api/v1/auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub roles: Vec<String>,
}

/// Public view of a user (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_active: bool,
    pub roles: Vec<String>,
}

impl UserResponse {
    pub fn new(user: &User, roles: Vec<String>) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_active: user.is_active,
            roles,
        }
    }
}

/// Live role set of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRolesResponse {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_are_exact() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("EventManager".parse::<Role>(), Ok(Role::EventManager));
        assert!("admin".parse::<Role>().is_err());
        assert!("Superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_user_debug_redacts_password_hash() {
        let user = User {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            display_name: "Alice".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        let debug_str = format!("{user:?}");
        assert!(!debug_str.contains("$2b$12$"));
        assert!(debug_str.contains("alice@example.com"));
    }
}
