//! Metrics definitions for the event manager API.
//!
//! # Cardinality
//!
//! - `outcome`: bounded by `AuthOutcome::label` (6 values)

use common::auth::{AuthOutcome, OutcomeObserver};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

/// Install the global Prometheus recorder and return its handle.
///
/// # Errors
///
/// Returns error if the recorder cannot be installed (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one authentication decision
///
/// Metric: `event_manager_api_auth_outcomes_total`
/// Labels: `outcome`
pub fn record_auth_outcome(outcome: &AuthOutcome) {
    counter!("event_manager_api_auth_outcomes_total", "outcome" => outcome.label()).increment(1);
}

/// Observer to register on the service's `AuthHandler`.
#[must_use]
pub fn auth_outcome_observer() -> OutcomeObserver {
    Arc::new(record_auth_outcome)
}
