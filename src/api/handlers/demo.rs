//! `/demo/flaky-request`: only routed when chaos is enabled.
use axum::Json;
use tracing::{error, info};

use crate::api::dto::message::ApiResponse;
use crate::error::AppError;
use crate::services::chaos;

pub async fn flaky_request() -> Result<Json<ApiResponse>, AppError> {
    let roll = chaos::roll()?;
    tokio::time::sleep(roll.delay).await;
    let delay_ms = roll.delay.as_millis() as u64;
    info!(delay_ms, "simulating a delay");

    if roll.fail {
        error!("simulating a random failure");
        return Err(AppError::Unexpected(anyhow::anyhow!(
            "Simulated internal server error!"
        )));
    }

    Ok(Json(ApiResponse::new(format!(
        "Successful but flaky response after {delay_ms}ms."
    ))))
}
