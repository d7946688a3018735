//! Panvert Storage Library
//!
//! Durable job status records and the on-disk staging area for uploaded
//! documents, converter templates and conversion artifacts.
//!
//! # On-disk layout
//!
//! - Staged inputs and artifacts: `<upload_dir>/<random id>.<ext>`
//! - Job status records: `<status_dir>/<job id>.json`
//!
//! Names handed to this crate are single path components. Anything that could
//! address a file outside its directory is rejected.

pub mod file_store;
pub(crate) mod names;
pub mod staged;
pub mod traits;

// Re-export commonly used types
pub use file_store::FileJobStatusStore;
pub use staged::{StagedFiles, StagingArea};
pub use traits::{JobStatusStore, StoreError, StoreResult};
