//! HTTP routes for the identity service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers::metrics::metrics_handler;
use crate::handlers::{self, admin_handler, auth_handler, me, user_handler};
use crate::models::Role;
use crate::repositories::UserRepository;
use crate::services::{LocalTokenValidator, TokenService};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use common::auth::{require_any_role, require_auth, AuthHandler, RequiredRoles};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// User store.
    pub users: Arc<dyn UserRepository>,

    /// Token issuance and validation.
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, users: Arc<dyn UserRepository>) -> Self {
        let tokens = TokenService::new(users.clone(), config.jwt.clone());
        Self {
            config,
            users,
            tokens,
        }
    }
}

/// Build the application routes.
///
/// - Public: `/health`, `/metrics`, token issuance, token validation,
///   registration
/// - Bearer: `/api/v1/me`
/// - Bearer + `Admin`: `/api/v1/admin/...`
///
/// Protected routes authenticate through the shared `AuthHandler` backed by
/// an in-process `LocalTokenValidator`.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_handler = Arc::new(AuthHandler::new(Arc::new(LocalTokenValidator::new(
        state.tokens.clone(),
    ))));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/auth/token", post(auth_handler::issue_token))
        .route("/api/v1/auth/validate", get(auth_handler::validate_token))
        .route("/api/v1/users/register", post(user_handler::register))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    // Layer order: require_any_role runs after require_auth inserted the principal
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/users/:id/roles",
            get(admin_handler::list_roles).post(admin_handler::add_role),
        )
        .route(
            "/api/v1/admin/users/:id/roles/:role",
            delete(admin_handler::remove_role),
        )
        .route(
            "/api/v1/admin/users/:id/active",
            put(admin_handler::set_active),
        )
        .layer(from_fn_with_state(
            RequiredRoles::any_of([Role::Admin.as_str()]),
            require_any_role,
        ))
        .with_state(state);

    let protected_routes = Router::new()
        .route("/api/v1/me", get(me::get_me))
        .merge(admin_routes)
        .layer(from_fn_with_state(auth_handler, require_auth));

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
