//! User registration and role administration.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::{NewUser, Role, User, UserResponse, UserRolesResponse};
use crate::repositories::UserRepository;
use crate::services::token_service::normalize_email;
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Register a new user holding the `User` role.
///
/// # Steps
///
/// 1. Validate email format
/// 2. Validate password (min 8 chars)
/// 3. Validate display name
/// 4. Hash password (bcrypt)
/// 5. Insert user (duplicate email => `Conflict`)
/// 6. Add default `User` role
pub async fn register_user(
    users: &dyn UserRepository,
    bcrypt_cost: u32,
    request: RegistrationRequest,
) -> Result<UserResponse, ApiError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest(
            "Display name cannot be empty".to_string(),
        ));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters"
        )));
    }

    if users.get_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = crypto::hash_password(&request.password, bcrypt_cost)?;

    let user = users
        .create_user(
            NewUser {
                email: &email,
                password_hash: &password_hash,
                display_name,
            },
            Role::User,
        )
        .await?;
    let roles = users.get_user_roles(user.user_id).await?;

    tracing::info!(target: "user_api.users", user_id = %user.user_id, "User registered");

    Ok(UserResponse::new(&user, roles))
}

/// Create the bootstrap administrator if the email is not taken yet.
///
/// Returns the user id whether it was created now or already existed. An
/// existing account is granted `Admin` and reactivated if it was disabled,
/// but its password is left untouched.
pub async fn ensure_admin(
    users: &dyn UserRepository,
    bcrypt_cost: u32,
    email: &str,
    password: &str,
) -> Result<Uuid, ApiError> {
    let email = normalize_email(email);

    let user = match users.get_by_email(&email).await? {
        Some(existing) => existing,
        None => {
            let response = register_user(
                users,
                bcrypt_cost,
                RegistrationRequest {
                    email: email.clone(),
                    password: password.to_string(),
                    display_name: "Administrator".to_string(),
                },
            )
            .await?;
            return grant_admin(users, response.user_id).await;
        }
    };

    if !user.is_active {
        users.set_user_active(user.user_id, true).await?;
        tracing::warn!(
            target: "user_api.users",
            user_id = %user.user_id,
            "Bootstrap admin account was inactive, reactivated"
        );
    }

    grant_admin(users, user.user_id).await
}

async fn grant_admin(users: &dyn UserRepository, user_id: Uuid) -> Result<Uuid, ApiError> {
    users.add_user_role(user_id, Role::Admin).await?;
    tracing::info!(target: "user_api.users", user_id = %user_id, "Bootstrap admin ensured");
    Ok(user_id)
}

/// Live roles of an existing user.
pub async fn get_roles(
    users: &dyn UserRepository,
    user_id: Uuid,
) -> Result<UserRolesResponse, ApiError> {
    require_user(users, user_id).await?;
    let roles = users.get_user_roles(user_id).await?;
    Ok(UserRolesResponse { user_id, roles })
}

/// Grant a role. Tokens issued before the change keep their old role set.
pub async fn add_role(
    users: &dyn UserRepository,
    user_id: Uuid,
    role: &str,
) -> Result<UserRolesResponse, ApiError> {
    let role = parse_role(role)?;
    require_user(users, user_id).await?;

    users.add_user_role(user_id, role).await?;
    tracing::info!(target: "user_api.users", user_id = %user_id, role = %role, "Role granted");

    get_roles(users, user_id).await
}

/// Revoke a role. Outstanding tokens embedding it stop validating at once.
///
/// An administrator cannot revoke their own `Admin` role.
pub async fn remove_role(
    users: &dyn UserRepository,
    acting_user: &str,
    user_id: Uuid,
    role: &str,
) -> Result<UserRolesResponse, ApiError> {
    let role = parse_role(role)?;
    if role == Role::Admin && acting_user == user_id.to_string() {
        return Err(ApiError::Forbidden(
            "Administrators cannot revoke their own Admin role".to_string(),
        ));
    }
    require_user(users, user_id).await?;

    users.remove_user_role(user_id, role).await?;
    tracing::info!(target: "user_api.users", user_id = %user_id, role = %role, "Role revoked");

    get_roles(users, user_id).await
}

/// Activate or deactivate an account. Deactivation invalidates every
/// outstanding token of the user.
pub async fn set_active(
    users: &dyn UserRepository,
    acting_user: &str,
    user_id: Uuid,
    is_active: bool,
) -> Result<UserResponse, ApiError> {
    if !is_active && acting_user == user_id.to_string() {
        return Err(ApiError::Forbidden(
            "Administrators cannot deactivate themselves".to_string(),
        ));
    }

    if !users.set_user_active(user_id, is_active).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    tracing::info!(target: "user_api.users", user_id = %user_id, is_active, "User status changed");

    let user = require_user(users, user_id).await?;
    let roles = users.get_user_roles(user_id).await?;
    Ok(UserResponse::new(&user, roles))
}

async fn require_user(users: &dyn UserRepository, user_id: Uuid) -> Result<User, ApiError> {
    users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse::<Role>().map_err(ApiError::BadRequest)
}

/// Basic email validation: `local@domain.tld` with non-empty parts.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}
