//! PostgreSQL user repository.
//!
//! Tables: `users` and `user_roles` (see `migrations/`).

use crate::errors::ApiError;
use crate::models::{NewUser, Role, User};
use crate::repositories::UserRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password_hash, display_name, is_active, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to fetch user by id: {e}")))?;

        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, password_hash, display_name, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to fetch user by email: {e}")))?;

        Ok(user)
    }

    async fn create_user(
        &self,
        new_user: NewUser<'_>,
        initial_role: Role,
    ) -> Result<User, ApiError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ApiError::Database(format!("Failed to start transaction: {e}")))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, password_hash, display_name, is_active, created_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("An account with this email already exists".to_string())
            }
            _ => ApiError::Database(format!("Failed to create user: {e}")),
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            "#,
        )
        .bind(user.user_id)
        .bind(initial_role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to assign initial role: {e}")))?;

        // Dropping `tx` on an early return rolls both inserts back
        tx.commit()
            .await
            .map_err(|e| ApiError::Database(format!("Failed to commit transaction: {e}")))?;

        Ok(user)
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<String>, ApiError> {
        let roles: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to fetch user roles: {e}")))?;

        Ok(roles.into_iter().map(|(r,)| r).collect())
    }

    async fn add_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to add user role: {e}")))?;

        Ok(())
    }

    async fn remove_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1 AND role = $2
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to remove user role: {e}")))?;

        Ok(())
    }

    async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to update user status: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pg_repository_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<PgUserRepository>();
    }

    #[test]
    fn test_pg_repository_is_object_safe() {
        fn assert_repo<T: UserRepository + 'static>() {}
        assert_repo::<PgUserRepository>();
    }
}
