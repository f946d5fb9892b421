use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;

use crate::api::dto::auth::{LoginRequest, LoginResponse};
use crate::error::AppError;
use crate::state::AppState;

/// `POST /auth/login`: username/password → signed bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let principal = match state.app_auth.verify(req.username, req.password).await {
        Ok(principal) => principal,
        Err(err) => {
            state.metrics.failed_logins().inc();
            return Err(err.into());
        }
    };

    let jwt_token = state
        .tokens
        .generate(&principal.username, &principal.authorities)
        .map_err(|e| AppError::Unexpected(e.into()))?;

    state.metrics.successful_logins().inc();
    info!(user = %principal.username, "login succeeded, token issued");

    Ok(Json(LoginResponse { jwt_token }))
}
