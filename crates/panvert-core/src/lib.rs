//! Panvert Core Library
//!
//! This crate provides the domain models, error types, format registry and
//! configuration shared by every Panvert component.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

// Re-export commonly used types
pub use config::{Config, PanvertConfig};
pub use error::{AppError, ErrorMetadata, FormatSide, LogLevel};
pub use formats::{DestFormat, DestFormatInfo, SourceFormat, SourceFormatInfo};
pub use models::{
    CaptionPosition, ConversionOptions, JobId, JobStatus, JobUpdate, ReferenceLocation, TocDepth,
};
