use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use panvert_core::{AppError, JobId, JobStatus};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub job: Option<String>,
}

impl JobQuery {
    pub fn job_id(&self) -> Result<JobId, AppError> {
        self.job
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::MissingField("job".to_string()))?
            .parse()
    }
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "jobs",
    params(
        ("job" = String, Query, description = "Job id returned by /api/upload")
    ),
    responses(
        (status = 200, description = "Current job status", body = JobStatus),
        (status = 400, description = "Missing or malformed job id", body = ErrorResponse),
        (status = 404, description = "Unknown job", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "status"))]
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> Result<Json<JobStatus>, HttpAppError> {
    let Query(query) = query?;
    let id = query.job_id()?;

    let status = state
        .jobs
        .read(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;

    Ok(Json(status))
}
