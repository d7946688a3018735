use crate::error::{ErrorResponse, HttpAppError};
use crate::services::staging::{stage_multipart, UploadLimits};
use crate::state::AppState;
use crate::utils::stream::GuardedFileStream;
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    http::Response,
};
use panvert_core::{AppError, ConversionOptions, DestFormat, SourceFormat};
use panvert_processing::{metadata_hint, ConversionOutcome, ConversionRequest};
use panvert_storage::StagingArea;
use std::collections::HashMap;
use std::sync::Arc;

use super::attachment_response;

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingField(name.to_string()))
}

/// Convert an uploaded document and stream the result back.
///
/// Formats and options come from the query string only; text fields in the
/// form body are ignored. The query is validated before any of the body is
/// read.
#[utoipa::path(
    post,
    path = "/api/convert",
    tag = "conversion",
    params(
        ("from" = String, Query, description = "Source format id"),
        ("to" = String, Query, description = "Destination format id"),
        ("toc" = Option<String>, Query, description = "`true` to add a table of contents"),
        ("tocDepth" = Option<u8>, Query, description = "Table of contents depth, 1 to 6"),
        ("numberSections" = Option<String>, Query, description = "`true` to number sections"),
        ("embedResources" = Option<String>, Query, description = "`true` to embed resources in a standalone document"),
        ("noYaml" = Option<String>, Query, description = "`true` to disable YAML metadata blocks for markdown input"),
        ("referenceLocation" = Option<String>, Query, description = "document, section or block"),
        ("figureCaptionPosition" = Option<String>, Query, description = "above or below"),
        ("tableCaptionPosition" = Option<String>, Query, description = "above or below")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "`file` (or `files[0]`) and an optional `template`"),
    responses(
        (status = 200, description = "Converted document", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid format, option or missing file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse),
        (status = 504, description = "Conversion timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "convert"))]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response<Body>, HttpAppError> {
    let Query(params) = query?;

    let source = SourceFormat::parse(required(&params, "from")?)?;
    let dest = DestFormat::parse(required(&params, "to")?)?;
    let options = ConversionOptions::from_fields(|name| params.get(name).map(String::as_str))?;

    let limits = UploadLimits {
        max_file_bytes: state.config.max_file_size_bytes(),
        max_total_bytes: state.config.max_total_size_bytes(),
    };
    let stem = uuid::Uuid::new_v4().to_string();
    let mut upload = stage_multipart(&state.staging, multipart?, &stem, limits).await?;

    let input = upload
        .main
        .take()
        .ok_or_else(|| AppError::MissingField("file".to_string()))?;

    let template = match upload.template.take() {
        Some(template) if dest.supports_template() => Some(template.path),
        Some(template) => {
            tracing::debug!(dest = dest.id(), template = %template.name, "Ignoring template for destination");
            None
        }
        None => None,
    };

    let output_name = StagingArea::fresh_name(Some(dest.extension()));
    let output = state.staging.path_of(&output_name)?;
    upload.files.track(&output);

    let request = ConversionRequest {
        input: input.path,
        output,
        source: Some(source),
        dest,
        template,
        options,
    };

    match state.converter.convert(&request).await {
        ConversionOutcome::Succeeded => {}
        ConversionOutcome::Failed { diagnostic } => {
            return Err(AppError::ConversionFailed(metadata_hint(
                &diagnostic,
                request.options.no_yaml,
            ))
            .into());
        }
        ConversionOutcome::TimedOut { after } => {
            return Err(AppError::ConversionTimeout {
                after_secs: after.as_secs(),
            }
            .into());
        }
    }

    let file = tokio::fs::File::open(&request.output).await.map_err(|e| {
        tracing::error!(error = %e, "Converted file is missing");
        AppError::FileRead(e.to_string())
    })?;

    tracing::info!(
        source = source.id(),
        dest = dest.id(),
        original_name = %input.original_name,
        "Streaming converted document"
    );

    Ok(attachment_response(
        dest,
        GuardedFileStream::new(file, upload.files),
    )?)
}
