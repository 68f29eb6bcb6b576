//! Liveness check.

/// Handler for GET /health
#[tracing::instrument(skip_all, name = "user_api.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
