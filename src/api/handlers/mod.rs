pub mod actuator;
pub mod auth;
pub mod demo;
pub mod public;
pub mod secure;

use crate::error::AppError;

/// Router fallback. Runs behind the security chain, so unknown protected
/// paths still answer 401 first.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
