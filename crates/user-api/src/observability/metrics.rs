//! Metrics definitions for the identity service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `user_api_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `status`: 2 values (success, error)
//! - `reason`: bounded by `TokenCheckFailure` (6 values including `none`)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// # Errors
///
/// Returns error if the recorder cannot be installed (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Issuance includes a bcrypt verify (~200ms at cost 12)
        .set_buckets_for_metric(
            Matcher::Prefix("user_api_token_issuance".to_string()),
            &[
                0.010, 0.050, 0.100, 0.200, 0.300, 0.500, 0.750, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record token issuance duration and outcome
///
/// Metrics: `user_api_token_issuance_total`,
/// `user_api_token_issuance_duration_seconds`
/// Labels: `status`
pub fn record_token_issuance(status: &'static str, duration: Duration) {
    histogram!("user_api_token_issuance_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());

    counter!("user_api_token_issuance_total", "status" => status).increment(1);
}

/// Record a token validation decision
///
/// Metric: `user_api_token_validations_total`
/// Labels: `status`, `reason`
pub fn record_token_validation(status: &'static str, reason: &'static str) {
    counter!("user_api_token_validations_total", "status" => status, "reason" => reason)
        .increment(1);
}
