//! HTTP routes for the event manager API.

use crate::handlers::{self, manage, me, metrics::metrics_handler};
use crate::observability::metrics::auth_outcome_observer;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use common::auth::{require_any_role, require_auth, AuthHandler, RequiredRoles, TokenValidator};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes around an injected token validator.
///
/// - Public: `/health`, `/metrics`
/// - Bearer: `/api/v1/me`
/// - Bearer + `EventManager` or `Admin`: `/api/v1/manage/access`
///
/// Production injects a `RemoteTokenValidator` pointing at the identity
/// service.
pub fn build_routes(validator: Arc<dyn TokenValidator>, metrics_handle: PrometheusHandle) -> Router {
    let auth_handler =
        Arc::new(AuthHandler::new(validator).with_observer(auth_outcome_observer()));

    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let manage_routes = Router::new()
        .route("/api/v1/manage/access", get(manage::get_access))
        .layer(from_fn_with_state(
            RequiredRoles::any_of(manage::MANAGER_ROLES),
            require_any_role,
        ));

    let protected_routes = Router::new()
        .route("/api/v1/me", get(me::get_me))
        .merge(manage_routes)
        .layer(from_fn_with_state(auth_handler, require_auth));

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
