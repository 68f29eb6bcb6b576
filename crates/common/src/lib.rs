//! Common utilities and types shared across the ticketing platform services.

#![warn(clippy::pedantic)]

/// Module for bearer authentication (handler, validators, principal, middleware)
pub mod auth;

/// Module for JWT utilities (claims, size limits, unverified decoding)
pub mod jwt;

/// Module for secret types that prevent accidental logging
pub mod secret;
