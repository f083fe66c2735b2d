mod auth;
mod error_handler;

pub use auth::AuthUser;
pub use error_handler::log_errors;
