use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{Principal, SecurityContext};

/// Handler で、認証済みの Principal を受け取るための extractor
/// security chain が SecurityContext を request.extensions() に insert 済みである前提
/// 見つからない・未認証の場合は 401 を返す
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    /// Method-level role check. Runs inside the handler, so an audited route
    /// records the denial as a failure.
    pub fn require_role(self, role: &str) -> Result<Principal, AppError> {
        if self.0.has_role(role) {
            Ok(self.0)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::principal)
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
