//! Event manager API library.
//!
//! A downstream service of the ticketing platform. Every protected request
//! is authenticated by the shared `common::auth::AuthHandler`, which asks
//! the identity service whether the bearer token is still valid.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
