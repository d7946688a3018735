//! Background runner for asynchronous conversions
//!
//! Each accepted upload is converted on its own task. The task is the error
//! boundary for the job: whatever happens during conversion, it records an
//! outcome on the status record and removes the staged inputs.

use panvert_core::{AppError, DestFormat, ErrorMetadata, JobStatus, JobUpdate, SourceFormat};
use panvert_processing::{is_scrapbox_export, metadata_hint, ConversionOutcome, ConversionRequest};
use panvert_storage::{StagedFiles, StagingArea};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::store_error;
use crate::state::AppState;

/// Spawn the conversion for a job whose record has already been created.
///
/// `files` must track the staged input and template; ownership of their
/// cleanup passes to the task.
pub fn spawn_job(state: Arc<AppState>, job: JobStatus, files: StagedFiles) -> JoinHandle<()> {
    tokio::spawn(run_job(state, job, files))
}

#[tracing::instrument(skip_all, fields(job_id = %job.id, dest = %job.dest_format))]
async fn run_job(state: Arc<AppState>, job: JobStatus, mut files: StagedFiles) {
    let update = match convert_job(&state, &job, &mut files).await {
        Ok(update) => update,
        Err(e) => {
            tracing::error!(error = %e, "Job failed before conversion");
            JobUpdate::Failed {
                error: e.client_message(),
            }
        }
    };

    // Artifacts and Scrapbox inputs stay on disk only once the record points at them.
    let keep = match &update {
        JobUpdate::Succeeded { result } => state.staging.path_of(result).ok(),
        JobUpdate::Scrapbox => state.staging.path_of(&job.input_name).ok(),
        JobUpdate::Failed { .. } => None,
    };

    match state.jobs.update(job.id, update).await {
        Ok(status) => {
            if let Some(path) = keep {
                files.release(&path);
            }
            tracing::info!(
                success = status.success.unwrap_or(false),
                scrapbox = status.scrapbox,
                "Job finished"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record job outcome");
            if let Err(e) = state.jobs.delete(job.id).await {
                tracing::warn!(error = %e, "Failed to delete job record");
            }
        }
    }
}

async fn convert_job(
    state: &AppState,
    job: &JobStatus,
    files: &mut StagedFiles,
) -> Result<JobUpdate, AppError> {
    let input = state.staging.path_of(&job.input_name).map_err(store_error)?;

    if is_scrapbox_export(&input, state.config.max_file_size_bytes()).await {
        tracing::info!("Input is a Scrapbox export, skipping conversion");
        return Ok(JobUpdate::Scrapbox);
    }

    let dest = DestFormat::parse(&job.dest_format)?;
    let source = job
        .source_format
        .as_deref()
        .map(SourceFormat::parse)
        .transpose()?;
    let template = match &job.template_name {
        Some(name) if dest.supports_template() => {
            Some(state.staging.path_of(name).map_err(store_error)?)
        }
        _ => None,
    };

    let result = StagingArea::fresh_name(Some(dest.extension()));
    let output = state.staging.path_of(&result).map_err(store_error)?;
    files.track(&output);

    let request = ConversionRequest {
        input,
        output,
        source,
        dest,
        template,
        options: job.options.clone(),
    };

    Ok(match state.converter.convert(&request).await {
        ConversionOutcome::Succeeded => JobUpdate::Succeeded { result },
        ConversionOutcome::Failed { diagnostic } => JobUpdate::Failed {
            error: metadata_hint(&diagnostic, job.options.no_yaml),
        },
        ConversionOutcome::TimedOut { after } => JobUpdate::Failed {
            error: AppError::ConversionTimeout {
                after_secs: after.as_secs(),
            }
            .client_message(),
        },
    })
}
