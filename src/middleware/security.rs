//! Security chain: path → chain → authenticate → authorize.
//!
//! - The `SecurityContext` is created per request and handed to handlers via
//!   request extensions (`CurrentUser` extractor reads it back).
//! - Failures are answered here with 401 / 403 structured bodies; handlers
//!   behind a denied rule never run.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::extractors::SecurityContext;
use crate::error::AppError;
use crate::middleware::auth::basic::{self, BasicOutcome};
use crate::middleware::auth::bearer;
use crate::policy::{Decision, Mechanism};
use crate::state::AppState;

const BASIC_CHALLENGE: &str = "Basic realm=\"Realm\"";

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, security_chain))
}

async fn security_chain(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let Some(chain) = state.policy.chain_for(&path) else {
        // no chain claims the path: deny
        warn!(path = %path, "no security chain matches request path");
        return AppError::Forbidden.into_response();
    };

    let mut ctx = SecurityContext::new();
    match chain.mechanism() {
        Mechanism::Bearer => {
            bearer::authenticate_bearer(
                req.headers(),
                &mut ctx,
                &state.tokens,
                state.app_auth.users(),
                &state.metrics.failed_logins(),
            );
        }
        Mechanism::Basic => {
            if basic::authenticate_basic(req.headers(), &mut ctx, &state.management_auth).await
                == BasicOutcome::Rejected
            {
                return challenge(Mechanism::Basic, AppError::BadCredentials);
            }
        }
    }

    match chain.access_for(&path).evaluate(&ctx) {
        Decision::Permit => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Decision::Unauthenticated => {
            debug!(chain = chain.name(), path = %path, "authentication required");
            challenge(chain.mechanism(), AppError::Unauthorized)
        }
        Decision::Forbidden => {
            let user = ctx.principal().map(|p| p.username.as_str()).unwrap_or("");
            warn!(chain = chain.name(), path = %path, user = %user, "access denied");
            AppError::Forbidden.into_response()
        }
    }
}

fn challenge(mechanism: Mechanism, err: AppError) -> Response {
    let mut res = err.into_response();
    if mechanism == Mechanism::Basic {
        res.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(BASIC_CHALLENGE),
        );
    }
    res
}
