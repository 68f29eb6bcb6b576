//! Identity service library.
//!
//! Owns users and their live role sets, issues HS256 user tokens and
//! answers validation requests from downstream services.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - JWT signing/verification and password hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `models` - Data models
//! - `observability` - Metrics
//! - `repositories` - User store (PostgreSQL and in-memory)
//! - `routes` - Router and application state
//! - `services` - Token issuance, role-consistency check, user administration

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
