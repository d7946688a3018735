use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use panvert_core::AppError;
use std::sync::Arc;

/// Bound the time until response headers are produced.
///
/// Expiry drops the handler future, so staged files owned by the request are
/// cleaned up by their guards. The client gets a JSON `REQUEST_TIMEOUT` body.
pub async fn request_timeout_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let limit = state.config.request_timeout();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_secs = limit.as_secs(), "Request timed out");
            HttpAppError(AppError::RequestTimeout {
                after_secs: limit.as_secs(),
            })
            .into_response()
        }
    }
}
