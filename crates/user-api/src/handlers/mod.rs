pub mod admin_handler;
pub mod auth_handler;
pub mod health;
pub mod me;
pub mod metrics;
pub mod user_handler;

pub use health::health_check;
