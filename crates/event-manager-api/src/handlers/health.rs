//! Liveness check. Does not contact the identity service.

#[tracing::instrument(skip_all, name = "event_manager_api.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
