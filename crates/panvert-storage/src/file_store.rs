use async_trait::async_trait;
use panvert_core::{JobId, JobStatus, JobUpdate};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::traits::{JobStatusStore, StoreError, StoreResult};

/// File-per-job status store.
///
/// Each record lives at `<dir>/<job id>.json`. Writes go to a hidden
/// temporary sibling first and are renamed into place, so readers never see
/// a partially written record.
pub struct FileJobStatusStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileJobStatusStore {
    /// Create the store, creating the status directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write_atomic(&self, status: &JobStatus) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(status)?;
        let final_path = self.record_path(status.id);
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", status.id, Uuid::new_v4().simple()));

        let write_result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &final_path).await
        }
        .await;

        if let Err(e) = write_result {
            if let Err(cleanup_err) = fs::remove_file(&tmp_path).await {
                if cleanup_err.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        error = %cleanup_err,
                        job_id = %status.id,
                        "Failed to remove temporary status file"
                    );
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    async fn read_record(&self, id: JobId) -> StoreResult<Option<JobStatus>> {
        let bytes = match fs::read(self.record_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let status = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            id,
            source,
        })?;
        Ok(Some(status))
    }
}

#[async_trait]
impl JobStatusStore for FileJobStatusStore {
    async fn create(&self, status: &JobStatus) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        if fs::try_exists(self.record_path(status.id)).await? {
            return Err(StoreError::AlreadyExists(status.id));
        }
        self.write_atomic(status).await?;
        tracing::debug!(job_id = %status.id, "Job status created");
        Ok(())
    }

    async fn update(&self, id: JobId, update: JobUpdate) -> StoreResult<JobStatus> {
        let _guard = self.write_lock.lock().await;
        let mut status = self
            .read_record(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        status.apply(update);
        self.write_atomic(&status).await?;
        tracing::debug!(
            job_id = %id,
            success = ?status.success,
            scrapbox = status.scrapbox,
            "Job status updated"
        );
        Ok(status)
    }

    async fn read(&self, id: JobId) -> StoreResult<Option<JobStatus>> {
        self.read_record(id).await
    }

    async fn delete(&self, id: JobId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
