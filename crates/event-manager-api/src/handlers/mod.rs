//! HTTP handlers for the event manager API.

pub mod health;
pub mod manage;
pub mod me;
pub mod metrics;

pub use health::health_check;
