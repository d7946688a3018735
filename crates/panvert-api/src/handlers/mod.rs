pub mod convert;
pub mod download;
pub mod fallback;
pub mod formats;
pub mod health;
pub mod status;
pub mod upload;

use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use panvert_core::{AppError, DestFormat};

use crate::utils::stream::GuardedFileStream;

/// Attachment response for a converted document.
///
/// `Content-Type` and the download name both come from the format registry
/// entry of `dest`.
pub(crate) fn attachment_response(
    dest: DestFormat,
    body: GuardedFileStream,
) -> Result<Response<Body>, AppError> {
    let content_disposition = format!("attachment; filename=\"{}\"", dest.download_name());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, dest.mime_type())
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
