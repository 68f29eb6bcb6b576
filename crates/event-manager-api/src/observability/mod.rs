//! Observability for the event manager API.

pub mod metrics;
