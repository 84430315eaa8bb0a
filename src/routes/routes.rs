//! Defines the gateway routes.
//!
//! ## Structure
//! - `GET  {api_path}` : version info (`?action=version` or none) or listing (`?action=list`)
//! - `POST {api_path}` : `?action=upload|rename|delete`, guarded by `X-Custom-Auth`
//! - `GET  /healthz`, `GET /readyz` : liveness and readiness
//!
//! Every response, including errors and preflights, carries the same
//! permissive CORS headers. `OPTIONS` on any path answers 204.

use crate::{
    errors::AppError,
    handlers::{
        api_handlers::{handle_get, handle_post},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

const ALLOW_HEADERS: &str = "Content-Type, X-Custom-Auth";

pub const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    (header::ACCESS_CONTROL_MAX_AGE, "86400"),
];

/// Build the router carrying `AppState`, with the API mounted at `api_path`
/// and request bodies capped at `max_body_bytes`.
pub fn routes(api_path: &str, max_body_bytes: usize) -> Router<AppState> {
    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(api_path, get(handle_get).post(handle_post))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http());

    for (name, value) in CORS_HEADERS {
        let value = HeaderValue::from_static(value);
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }
    router
}

/// Answer every `OPTIONS` request with an empty 204.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

async fn not_found() -> AppError {
    AppError::not_found("Not found")
}
