//! Error types module
//!
//! All request-facing failures are unified under the `AppError` enum. Each
//! variant describes its own HTTP presentation through [`ErrorMetadata`], so
//! the API layer only has to render what the error reports about itself.

use std::fmt;
use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for conversion problems caused by the submitted document
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_FORMAT")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Which side of a conversion a format name was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSide {
    Source,
    Destination,
}

impl fmt::Display for FormatSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSide::Source => f.write_str("source"),
            FormatSide::Destination => f.write_str("destination"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required field: '{0}'")]
    MissingField(String),

    #[error("Invalid {side} format: {format}")]
    InvalidFormat { format: String, side: FormatSide },

    #[error("File too large: limit is {max_bytes} bytes")]
    FileTooLarge { max_bytes: u64 },

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job not ready: {0}")]
    JobNotReady(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Conversion timed out after {after_secs}s")]
    ConversionTimeout { after_secs: u64 },

    #[error("Request timed out after {after_secs}s")]
    RequestTimeout { after_secs: u64 },

    #[error("Failed to read output file: {0}")]
    FileRead(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::BadRequest(format!("Invalid job id: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check conversion options and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::MissingField(_) => (
            400,
            "MISSING_FIELD",
            false,
            Some("Include the required field in the request"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidFormat { .. } => (
            400,
            "INVALID_FORMAT",
            false,
            Some("Use one of the formats listed by /api/formats"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooLarge { .. } => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::MethodNotAllowed(_) => (
            405,
            "METHOD_NOT_ALLOWED",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the job id exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::JobNotReady(_) => (
            409,
            "JOB_NOT_READY",
            true,
            Some("Poll /api/status until the job has finished"),
            false,
            LogLevel::Debug,
        ),
        AppError::RateLimited { .. } => (
            429,
            "RATE_LIMITED",
            true,
            Some("Wait for the Retry-After period and retry"),
            false,
            LogLevel::Debug,
        ),
        AppError::ConversionFailed(_) => (
            500,
            "CONVERSION_FAILED",
            false,
            Some("Check the document and conversion options"),
            false,
            LogLevel::Warn,
        ),
        AppError::ConversionTimeout { .. } => (
            504,
            "CONVERSION_TIMEOUT",
            false,
            Some("Try a smaller document or fewer options"),
            false,
            LogLevel::Warn,
        ),
        AppError::RequestTimeout { .. } => (
            408,
            "REQUEST_TIMEOUT",
            true,
            Some("Retry with a smaller document"),
            false,
            LogLevel::Warn,
        ),
        AppError::FileRead(_) => (
            500,
            "FILE_READ_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::Validation(_) => "Validation",
            AppError::MissingField(_) => "MissingField",
            AppError::InvalidFormat { .. } => "InvalidFormat",
            AppError::FileTooLarge { .. } => "FileTooLarge",
            AppError::MethodNotAllowed(_) => "MethodNotAllowed",
            AppError::NotFound(_) => "NotFound",
            AppError::JobNotReady(_) => "JobNotReady",
            AppError::RateLimited { .. } => "RateLimited",
            AppError::ConversionFailed(_) => "ConversionFailed",
            AppError::ConversionTimeout { .. } => "ConversionTimeout",
            AppError::RequestTimeout { .. } => "RequestTimeout",
            AppError::FileRead(_) => "FileRead",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::MissingField(_) => self.to_string(),
            AppError::InvalidFormat { .. } => self.to_string(),
            AppError::FileTooLarge { max_bytes } => format!(
                "File too large. Maximum size is {}MB",
                max_bytes / (1024 * 1024)
            ),
            AppError::MethodNotAllowed(_) => self.to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::JobNotReady(ref msg) => msg.clone(),
            AppError::RateLimited { .. } => "Too many requests. Please try again later.".to_string(),
            AppError::ConversionFailed(_) => self.to_string(),
            AppError::ConversionTimeout { after_secs } => {
                format!("Conversion timed out after {} seconds", after_secs)
            }
            AppError::RequestTimeout { after_secs } => {
                format!("Request timed out after {} seconds", after_secs)
            }
            AppError::FileRead(_) => "Failed to read output file".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
