//! Observability for the identity service.
//!
//! All instrumentation uses `#[instrument(skip_all)]`. Tokens, passwords,
//! signing secrets and user ids never appear in logs or metric labels.

pub mod metrics;
