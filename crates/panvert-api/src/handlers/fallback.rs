use crate::error::HttpAppError;
use axum::http::{Method, Uri};
use panvert_core::AppError;

/// Known route, unsupported method.
pub async fn method_not_allowed(method: Method) -> HttpAppError {
    HttpAppError(AppError::MethodNotAllowed(method.to_string()))
}

/// No route matched.
pub async fn not_found(uri: Uri) -> HttpAppError {
    HttpAppError(AppError::NotFound(format!("No route for {}", uri.path())))
}
