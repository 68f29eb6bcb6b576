pub mod local_validator;
pub mod token_service;
pub mod user_service;

pub use local_validator::LocalTokenValidator;
pub use token_service::{TokenCheckFailure, TokenService};
