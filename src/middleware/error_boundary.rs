//! Fills `path` of structured error bodies.
//!
//! `AppError::into_response` cannot see the request, so it leaves the
//! `ErrorResponse` in the response extensions; this layer re-renders the body
//! with the original request path. Must sit outside every layer that can
//! produce an `AppError`.

use axum::{
    Router,
    body::Body,
    extract::OriginalUri,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::ErrorResponse;

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(error_boundary))
}

async fn error_boundary(
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;

    let Some(mut body) = res.extensions_mut().remove::<ErrorResponse>() else {
        return res;
    };
    body.path = uri.path().to_string();

    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            res.headers_mut().remove(header::CONTENT_LENGTH);
            *res.body_mut() = Body::from(bytes);
        }
        Err(err) => tracing::warn!(error = %err, "could not re-render error body"),
    }
    res
}
