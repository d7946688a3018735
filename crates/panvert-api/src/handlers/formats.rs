use axum::Json;
use panvert_core::formats::{DEST_FORMATS, SOURCE_FORMATS};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SourceFormatEntry {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestFormatEntry {
    pub id: String,
    pub label: String,
    pub extension: String,
    pub mime_type: String,
    /// Accepts a `template` reference document
    pub supports_template: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FormatsResponse {
    pub source: Vec<SourceFormatEntry>,
    pub destination: Vec<DestFormatEntry>,
}

#[utoipa::path(
    get,
    path = "/api/formats",
    tag = "conversion",
    responses(
        (status = 200, description = "Supported source and destination formats", body = FormatsResponse)
    )
)]
pub async fn list_formats() -> Json<FormatsResponse> {
    let source = SOURCE_FORMATS
        .iter()
        .map(|f| SourceFormatEntry {
            id: f.id.to_string(),
            label: f.label.to_string(),
        })
        .collect();

    let destination = DEST_FORMATS
        .iter()
        .filter_map(|f| panvert_core::DestFormat::parse(f.id).ok())
        .map(|f| DestFormatEntry {
            id: f.id().to_string(),
            label: f.info().label.to_string(),
            extension: f.extension().to_string(),
            mime_type: f.mime_type().to_string(),
            supports_template: f.supports_template(),
        })
        .collect();

    Json(FormatsResponse {
        source,
        destination,
    })
}
