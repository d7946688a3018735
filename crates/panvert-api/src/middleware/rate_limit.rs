use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::ip_extraction::extract_client_ip;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use panvert_core::AppError;
use panvert_infra::RateLimitDecision;
use std::net::SocketAddr;
use std::sync::Arc;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

fn insert_number(headers: &mut HeaderMap, name: HeaderName, value: u64) {
    if let Ok(header_value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, header_value);
    }
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    insert_number(headers, RATE_LIMIT_LIMIT, u64::from(decision.limit));
    insert_number(headers, RATE_LIMIT_REMAINING, u64::from(decision.remaining));
    insert_number(headers, RATE_LIMIT_RESET, decision.reset_at);
}

/// Fixed-window rate limiting keyed on the client address.
///
/// Every response carries `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
/// `X-RateLimit-Reset` (unix seconds). Rejected requests get a 429
/// `RATE_LIMITED` body and `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = extract_client_ip(
        request.headers(),
        socket_addr.as_ref(),
        state.config.trusted_proxy_count(),
    );
    let key = format!("ip:{}", ip);

    let decision = state.rate_limiter.hit(&key).await;

    if decision.allowed {
        let mut response = next.run(request).await;
        apply_headers(response.headers_mut(), &decision);
        return response;
    }

    let retry_after_secs = decision.retry_after.as_secs().max(1);
    tracing::debug!(
        key = %key,
        path = %request.uri().path(),
        retry_after_secs,
        "Rate limit exceeded"
    );

    let mut response = HttpAppError(AppError::RateLimited { retry_after_secs }).into_response();
    apply_headers(response.headers_mut(), &decision);
    insert_number(
        response.headers_mut(),
        axum::http::header::RETRY_AFTER,
        retry_after_secs,
    );
    response
}
