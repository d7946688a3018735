//! Health check handler and response types.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the converter can be run, `degraded` otherwise
    pub status: String,
    /// Converter version, or `unavailable`
    pub pandoc: String,
}

/// Health check: the service is only useful if the converter runs.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Converter available", body = HealthResponse),
        (status = 503, description = "Converter unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.converter.version().await {
        Some(version) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                pandoc: version,
            }),
        ),
        None => {
            tracing::warn!("Converter health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    pandoc: "unavailable".to_string(),
                }),
            )
        }
    }
}
