//! User store.
//!
//! `UserRepository` is the seam between services and storage. The
//! PostgreSQL implementation is used when `DATABASE_URL` is configured;
//! the in-memory implementation backs development runs and tests.

pub mod memory;
pub mod users;

pub use memory::InMemoryUserRepository;
pub use users::PgUserRepository;

use crate::errors::ApiError;
use crate::models::{NewUser, Role, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Access to users and their live role assignments.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get user by `user_id`.
    async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError>;

    /// Get user by email (exact match, callers normalize).
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Create a new active user holding `initial_role`.
    ///
    /// The user row and the role are written together: either both exist
    /// afterwards or neither does. Returns `ApiError::Conflict` when the
    /// email is already taken.
    async fn create_user(
        &self,
        new_user: NewUser<'_>,
        initial_role: Role,
    ) -> Result<User, ApiError>;

    /// Live role names of a user, sorted. Empty for unknown users.
    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<String>, ApiError>;

    /// Add a role. Adding a role the user already holds is a no-op.
    async fn add_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError>;

    /// Remove a role. Removing a role the user does not hold is a no-op.
    async fn remove_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError>;

    /// Activate or deactivate a user. Returns false if the user does not exist.
    async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<bool, ApiError>;
}
