use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{actuator, auth, demo, public, secure};
use crate::middleware::audit::audited;
use crate::state::AppState;

pub fn routes(state: AppState, chaos_enabled: bool) -> Router<AppState> {
    let auditor = state.auditor.clone();

    let router = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/api/public/info", get(public::info))
        .route(
            secure::DATA_PATH,
            audited(get(secure::data), auditor.clone(), "SecureApi::data"),
        )
        .route(
            secure::ADMIN_PATH,
            audited(get(secure::admin), auditor, "SecureApi::admin"),
        )
        .route("/actuator/health", get(actuator::health))
        .route("/actuator/info", get(actuator::info))
        .route("/actuator/prometheus", get(actuator::prometheus));

    let router = if chaos_enabled {
        router.route("/demo/flaky-request", get(demo::flaky_request))
    } else {
        router
    };

    router.with_state(state)
}
