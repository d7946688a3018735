pub mod job;
pub mod options;

pub use job::{JobId, JobStatus, JobUpdate};
pub use options::{CaptionPosition, ConversionOptions, ReferenceLocation, TocDepth};
