//! Endpoints behind the bearer chain. Both are audited (see `api::routes`).
use axum::Json;
use axum::extract::State;

use crate::api::dto::message::ApiResponse;
use crate::api::extractors::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub const DATA_PATH: &str = "/api/secure/data";
pub const ADMIN_PATH: &str = "/api/secure/admin";

pub async fn data(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Json<ApiResponse> {
    state.metrics.secure_requests(DATA_PATH).inc();
    Json(ApiResponse::new(format!(
        "This is SECURE data for user: {}. You should only see this if you are authenticated.",
        user.username
    )))
}

pub async fn admin(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse>, AppError> {
    let user = current.require_role("ADMIN")?;
    state.metrics.secure_requests(ADMIN_PATH).inc();
    Ok(Json(ApiResponse::new(format!(
        "This is ADMIN-ONLY data for user: {}. You must have the 'ADMIN' role to see this.",
        user.username
    ))))
}
