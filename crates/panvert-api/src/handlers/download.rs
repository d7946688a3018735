use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::stream::GuardedFileStream;
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::Response,
};
use panvert_core::{AppError, DestFormat};
use panvert_storage::StagedFiles;
use std::sync::Arc;

use super::attachment_response;
use super::status::JobQuery;

/// Stream a finished artifact once.
///
/// The artifact and its status record are deleted when the response body is
/// finished or abandoned.
#[utoipa::path(
    get,
    path = "/api/download",
    tag = "jobs",
    params(
        ("job" = String, Query, description = "Job id returned by /api/upload")
    ),
    responses(
        (status = 200, description = "Converted document", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown or failed job", body = ErrorResponse),
        (status = 409, description = "Conversion still running", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "download", job_id))]
pub async fn download(
    State(state): State<Arc<AppState>>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> Result<Response<Body>, HttpAppError> {
    let Query(query) = query?;
    let id = query.job_id()?;
    tracing::Span::current().record("job_id", tracing::field::display(id));

    let status = state
        .jobs
        .read(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;

    if !status.is_terminal() {
        return Err(AppError::JobNotReady(format!("Job {} is still converting", id)).into());
    }
    let artifact = status
        .artifact()
        .ok_or_else(|| AppError::NotFound(format!("Job {} has no converted file", id)))?;

    let dest = DestFormat::parse(&status.dest_format)?;
    let path = state.staging.path_of(artifact)?;
    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::error!(error = %e, "Converted file is missing");
        AppError::FileRead(e.to_string())
    })?;

    let mut files = StagedFiles::new();
    files.track(&path);

    let jobs = state.jobs.clone();
    let body = GuardedFileStream::new(file, files).on_finish(move || {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(job_id = %id, "No runtime to delete job record");
            return;
        };
        handle.spawn(async move {
            if let Err(e) = jobs.delete(id).await {
                tracing::warn!(error = %e, job_id = %id, "Failed to delete job record");
            }
        });
    });

    tracing::info!(dest = dest.id(), "Streaming converted document");
    Ok(attachment_response(dest, body)?)
}
