use axum::Json;

use crate::api::dto::message::ApiResponse;

pub async fn info() -> Json<ApiResponse> {
    Json(ApiResponse::new(
        "This is PUBLIC information. Anyone can see this.",
    ))
}
