//! Route and middleware setup

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{get, post},
    Json, Router,
};
use panvert_core::Config;
use panvert_infra::{request_id_middleware, RequestId};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{convert, download, fallback, formats, health, status, upload};
use crate::middleware::error_details::error_details_middleware;
use crate::middleware::rate_limit::{
    rate_limit_middleware, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET,
};
use crate::middleware::timeout::request_timeout_middleware;
use crate::state::AppState;

/// Room for multipart boundaries and text fields on top of the file payload.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let body_limit = config
        .max_total_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    tracing::info!(
        body_limit_bytes = body_limit,
        request_timeout_secs = config.request_timeout().as_secs(),
        "Configuring routes"
    );

    Router::new()
        .merge(conversion_routes(state.clone()))
        .merge(job_routes())
        .merge(public_routes())
        .fallback(fallback::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_timeout_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_details_middleware,
        ))
        .layer(setup_cors(config))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Upload-accepting routes; the only ones subject to rate limiting.
fn conversion_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/convert",
            post(convert::convert).fallback(fallback::method_not_allowed),
        )
        .route(
            "/api/upload",
            post(upload::upload).fallback(fallback::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}

fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/status",
            get(status::job_status).fallback(fallback::method_not_allowed),
        )
        .route(
            "/api/download",
            get(download::download).fallback(fallback::method_not_allowed),
        )
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/health",
            get(health::health_check).fallback(fallback::method_not_allowed),
        )
        .route(
            "/api/formats",
            get(formats::list_formats).fallback(fallback::method_not_allowed),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) })
                .fallback(fallback::method_not_allowed),
        )
}

/// Setup CORS configuration
///
/// `*` allows any origin; otherwise only the listed origins. Rate-limit
/// headers and the download filename are exposed to browser clients.
pub fn setup_cors(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_DISPOSITION,
            RATE_LIMIT_LIMIT,
            RATE_LIMIT_REMAINING,
            RATE_LIMIT_RESET,
            header::RETRY_AFTER,
        ]);

    if config.cors_origins().iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
