//! Audit aspect for HTTP handlers.
//!
//! Attached per route at registration time:
//!
//! ```ignore
//! .route("/api/secure/data", audit::audited(get(secure_data), auditor, "SecureApi::secure_data"))
//! ```
//!
//! The handler's response is passed through untouched; a `FailureDetail` in the
//! response extensions (put there by `AppError::into_response`) marks FAILURE.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, State},
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::extractors::SecurityContext;
use crate::services::audit::{AuditScope, Auditor, FailureDetail, RequestMetadata};

#[derive(Clone)]
struct AuditTarget {
    auditor: Arc<Auditor>,
    operation: &'static str,
}

/// Wraps one route's handler(s) so every call is recorded under `operation`.
pub fn audited<S>(
    route: MethodRouter<S>,
    auditor: Arc<Auditor>,
    operation: &'static str,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(
        AuditTarget { auditor, operation },
        audit_middleware,
    ))
}

async fn audit_middleware(
    State(target): State<AuditTarget>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let scope = scope_from_request(&req);
    let in_flight = target.auditor.start(target.operation, scope);

    let res = next.run(req).await;

    match res.extensions().get::<FailureDetail>() {
        Some(detail) => in_flight.failure(detail.clone()),
        None => in_flight.success(),
    }
    res
}

fn scope_from_request(req: &Request<Body>) -> AuditScope {
    let principal = req
        .extensions()
        .get::<SecurityContext>()
        .and_then(SecurityContext::principal)
        .cloned();

    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let request_uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    AuditScope {
        principal,
        request: Some(RequestMetadata {
            remote_addr,
            request_uri,
            user_agent,
        }),
    }
}
