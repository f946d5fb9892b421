/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

/// No identity with this username exists in the queried source.
///
/// Callers must not turn this into a response that differs from a wrong password.
#[derive(Debug, Error)]
#[error("{source_name} user not found: {username}")]
pub struct UserNotFound {
    pub source_name: &'static str,
    pub username: String,
}
