//! In-memory user repository.
//!
//! Used when no database is configured and by tests. Reads take the read
//! lock only, so concurrent token validations never serialize.

use crate::errors::ApiError;
use crate::models::{NewUser, Role, User};
use crate::repositories::UserRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Store {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, BTreeSet<Role>>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Store>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a user and their roles. Returns false if the user did not exist.
    pub async fn delete_user(&self, user_id: Uuid) -> bool {
        let mut store = self.store.write().await;
        store.roles.remove(&user_id);
        store.users.remove(&user_id).is_some()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.store.read().await.users.get(&user_id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .store
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(
        &self,
        new_user: NewUser<'_>,
        initial_role: Role,
    ) -> Result<User, ApiError> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.email == new_user.email) {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let user = User {
            user_id: Uuid::new_v4(),
            email: new_user.email.to_string(),
            password_hash: new_user.password_hash.to_string(),
            display_name: new_user.display_name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        store.users.insert(user.user_id, user.clone());
        store
            .roles
            .insert(user.user_id, BTreeSet::from([initial_role]));

        Ok(user)
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<String>, ApiError> {
        let store = self.store.read().await;
        let mut roles: Vec<String> = store
            .roles
            .get(&user_id)
            .map(|set| set.iter().map(|r| r.as_str().to_string()).collect())
            .unwrap_or_default();
        roles.sort();
        Ok(roles)
    }

    async fn add_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&user_id) {
            return Err(ApiError::Database(format!(
                "Failed to add user role: unknown user {user_id}"
            )));
        }

        store.roles.entry(user_id).or_default().insert(role);
        Ok(())
    }

    async fn remove_user_role(&self, user_id: Uuid, role: Role) -> Result<(), ApiError> {
        if let Some(set) = self.store.write().await.roles.get_mut(&user_id) {
            set.remove(&role);
        }
        Ok(())
    }

    async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> Result<bool, ApiError> {
        match self.store.write().await.users.get_mut(&user_id) {
            Some(user) => {
                user.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
