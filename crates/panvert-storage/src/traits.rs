//! Job status store abstraction
//!
//! The API layer only talks to [`JobStatusStore`]; the file-per-job backend
//! is the default implementation.

use async_trait::async_trait;
use panvert_core::{JobId, JobStatus, JobUpdate};
use thiserror::Error;

/// Job status store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Corrupt status record for job {id}: {source}")]
    Corrupt {
        id: JobId,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable per-job status records.
///
/// Implementations must make a record visible to `read` only once it has
/// been fully written, so a poll racing with `create` or `update` observes
/// either the previous record or the new one.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Persist a new record. Fails if the id is already in use.
    async fn create(&self, status: &JobStatus) -> StoreResult<()>;

    /// Apply an outcome to an existing record and return the stored result.
    async fn update(&self, id: JobId, update: JobUpdate) -> StoreResult<JobStatus>;

    /// Read a record, `None` if no job with this id exists.
    async fn read(&self, id: JobId) -> StoreResult<Option<JobStatus>>;

    /// Remove a record. Returns `false` if it did not exist.
    async fn delete(&self, id: JobId) -> StoreResult<bool>;
}
