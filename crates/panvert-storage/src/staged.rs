//! Staging area for uploaded inputs, templates and conversion artifacts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::names::join_name;
use crate::traits::StoreResult;

/// Directory holding every file a conversion reads or writes.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub async fn new(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate a fresh, unguessable file name with the given extension.
    pub fn fresh_name(extension: Option<&str>) -> String {
        Self::name_for(&Uuid::new_v4().to_string(), extension)
    }

    /// `<stem>.<ext>`, or just `<stem>` when there is no extension.
    pub fn name_for(stem: &str, extension: Option<&str>) -> String {
        match extension {
            Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
            _ => stem.to_string(),
        }
    }

    /// Resolve a staged file name to its path inside the staging directory.
    pub fn path_of(&self, name: &str) -> StoreResult<PathBuf> {
        join_name(&self.dir, name)
    }

    /// Delete a staged file. Missing files count as already deleted.
    pub async fn remove(&self, name: &str) -> bool {
        let path = match self.path_of(name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Refusing to delete staged file");
                return false;
            }
        };
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(error = %e, file = %name, "Failed to delete staged file");
                false
            }
        }
    }
}

/// Drop guard over staged files.
///
/// Every file registered with [`StagedFiles::track`] is deleted when the
/// guard is dropped, unless it has been released first. Request handlers
/// register each file as soon as it is created so every early return, error
/// and dropped request future removes what was written.
#[derive(Debug, Default)]
pub struct StagedFiles {
    paths: Vec<PathBuf>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Stop tracking `path` so it survives the guard. Returns whether it was tracked.
    pub fn release(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed staged file");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Failed to remove staged file"
                    );
                }
            }
        }
    }
}
