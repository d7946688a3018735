use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::options::ConversionOptions;
use crate::error::AppError;

/// Identifier of an asynchronous conversion job.
///
/// Always a random v4 UUID, so it is unguessable and safe to use as a path
/// segment. The staged input is stored as `<id>.<ext>` and its status record
/// as `<id>.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        JobId(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobId(Uuid::parse_str(s.trim())?))
    }
}

/// Outcome recorded on a job once the background conversion has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    /// Artifact written to the staging directory under `result`.
    Succeeded { result: String },
    Failed { error: String },
    /// Input was recognised as a Scrapbox export and left unconverted.
    Scrapbox,
}

/// Persisted state of one asynchronous conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub id: JobId,
    /// Sanitized client filename, for display only
    pub original_name: String,
    /// On-disk name of the staged input, relative to the staging directory
    pub input_name: String,
    pub dest_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
    /// On-disk name of the staged reference document, if one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    pub options: ConversionOptions,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Artifact file name, relative to the staging directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub scrapbox: bool,
}

impl JobStatus {
    pub fn new(
        id: JobId,
        original_name: String,
        input_name: String,
        dest_format: String,
        source_format: Option<String>,
        template_name: Option<String>,
        options: ConversionOptions,
    ) -> Self {
        Self {
            id,
            original_name,
            input_name,
            dest_format,
            source_format,
            template_name,
            options,
            created_at: Utc::now(),
            completed_at: None,
            success: None,
            error: None,
            result: None,
            scrapbox: false,
        }
    }

    /// Record the outcome of the conversion.
    ///
    /// This is the only place the outcome fields change, and each update
    /// clears the fields of the other outcomes so `success` and `error` are
    /// never set together.
    pub fn apply(&mut self, update: JobUpdate) {
        match update {
            JobUpdate::Succeeded { result } => {
                self.success = Some(true);
                self.error = None;
                self.result = Some(result);
                self.scrapbox = false;
            }
            JobUpdate::Failed { error } => {
                self.success = None;
                self.error = Some(error);
                self.result = None;
                self.scrapbox = false;
            }
            JobUpdate::Scrapbox => {
                self.success = None;
                self.error = None;
                self.result = None;
                self.scrapbox = true;
            }
        }
        self.completed_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.success.is_some() || self.error.is_some() || self.scrapbox
    }

    /// Artifact name, present only when the conversion succeeded.
    pub fn artifact(&self) -> Option<&str> {
        match self.success {
            Some(true) => self.result.as_deref(),
            _ => None,
        }
    }
}
