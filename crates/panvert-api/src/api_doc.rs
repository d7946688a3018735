//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use panvert_core::models;

/// Returns the OpenAPI document served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Panvert API",
        version = "0.1.0",
        description = "Document conversion service. Upload a document with source and destination formats; convert synchronously with /api/convert or queue a job with /api/upload and poll /api/status."
    ),
    paths(
        // Conversion
        handlers::convert::convert,
        handlers::formats::list_formats,
        // Jobs
        handlers::upload::upload,
        handlers::status::job_status,
        handlers::download::download,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            // Job models
            models::JobId,
            models::JobStatus,
            models::ConversionOptions,
            models::TocDepth,
            models::ReferenceLocation,
            models::CaptionPosition,
            // Responses
            handlers::upload::UploadResponse,
            handlers::formats::FormatsResponse,
            handlers::formats::SourceFormatEntry,
            handlers::formats::DestFormatEntry,
            handlers::health::HealthResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "conversion", description = "Synchronous conversion and the format registry"),
        (name = "jobs", description = "Asynchronous conversion jobs: upload, poll, download"),
        (name = "health", description = "Converter availability")
    )
)]
pub struct ApiDoc;
