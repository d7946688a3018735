use crate::error::ErrorDetails;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Re-render error bodies with their `details` outside production.
///
/// [`HttpAppError`](crate::error::HttpAppError) always renders the public
/// body and attaches the detailed one as an extension; the environment lives
/// in [`Config`](panvert_core::Config), which only middleware can reach.
pub async fn error_details_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(ErrorDetails(detailed)) = response.extensions_mut().remove::<ErrorDetails>() else {
        return response;
    };
    if state.config.is_production() {
        return response;
    }

    let (parts, _) = response.into_parts();
    let body = Json(detailed).into_response().into_body();
    Response::from_parts(parts, body)
}
