use crate::error::{ErrorResponse, HttpAppError};
use crate::services::jobs::spawn_job;
use crate::services::staging::{stage_multipart, UploadLimits};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use panvert_core::{AppError, ConversionOptions, DestFormat, JobId, JobStatus, SourceFormat};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub id: JobId,
}

/// Accept a document for background conversion.
///
/// Formats and options come from the form fields only. Responds as soon as
/// the job is recorded; poll `/api/status` for the outcome.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "jobs",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "`file` (or `files[0]`), `format` (destination), optional `sourceFormat`, `template` and conversion options"
    ),
    responses(
        (status = 200, description = "Job accepted", body = UploadResponse),
        (status = 400, description = "Invalid format, option or missing field", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "upload", job_id))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let id = JobId::new();
    tracing::Span::current().record("job_id", tracing::field::display(id));

    let limits = UploadLimits {
        max_file_bytes: state.config.max_file_size_bytes(),
        max_total_bytes: state.config.max_total_size_bytes(),
    };
    let mut upload = stage_multipart(&state.staging, multipart?, &id.to_string(), limits).await?;

    let input = upload
        .main
        .take()
        .ok_or_else(|| AppError::MissingField("file".to_string()))?;

    let dest = upload
        .field("format")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingField("format".to_string()))
        .and_then(DestFormat::parse)?;
    let source = upload
        .field("sourceFormat")
        .filter(|v| !v.is_empty())
        .map(SourceFormat::parse)
        .transpose()?;
    let options = ConversionOptions::from_fields(|name| upload.field(name))?;

    let template = match upload.template.take() {
        Some(template) if dest.supports_template() => Some(template),
        Some(template) => {
            upload.files.release(&template.path);
            state.staging.remove(&template.name).await;
            None
        }
        None => None,
    };

    let job = JobStatus::new(
        id,
        input.original_name,
        input.name,
        dest.id().to_string(),
        source.map(|s| s.id().to_string()),
        template.map(|t| t.name),
        options,
    );
    state.jobs.create(&job).await?;

    // The background task now owns the staged files.
    spawn_job(state.clone(), job, upload.files);

    tracing::info!(dest = dest.id(), "Job accepted");
    Ok(Json(UploadResponse { success: true, id }))
}
