//! Periodic removal of stale staged files
//!
//! Request handlers delete their own files on every path they control. The
//! sweeper is the backstop for files orphaned by crashes or restarts: it
//! deletes any regular file older than the configured age from the watched
//! directories.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Placeholder files kept in the staging directory.
pub const RESERVED_NAMES: &[&str] = &["README.md", ".gitkeep"];

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub dirs: Vec<PathBuf>,
    pub max_age: Duration,
    pub interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background sweep task.
///
/// `start` and `stop` are idempotent: starting a running scheduler and
/// stopping an idle one are both no-ops.
pub struct CleanupScheduler {
    config: Arc<SweepConfig>,
    running: Mutex<Option<Running>>,
}

impl CleanupScheduler {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config: Arc::new(config),
            running: Mutex::new(None),
        }
    }

    /// Start sweeping. The first sweep runs immediately.
    ///
    /// Returns `false` if the scheduler was already running.
    pub fn start(&self) -> bool {
        let mut running = match self.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::debug!("Cleanup scheduler already running");
            return false;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let config = Arc::clone(&self.config);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        sweep_dirs(&config, SystemTime::now()).await;
                    }
                }
            }

            tracing::debug!("Cleanup scheduler loop exited");
        });

        *running = Some(Running { token, handle });

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            max_age_secs = self.config.max_age.as_secs(),
            "Cleanup scheduler started"
        );
        true
    }

    /// Stop sweeping and wait for an in-flight sweep to finish.
    ///
    /// Returns `false` if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        let running = {
            let mut guard = match self.running.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };

        let Some(Running { token, handle }) = running else {
            return false;
        };

        token.cancel();
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Cleanup task ended abnormally");
        }
        tracing::info!("Cleanup scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        match self.running.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|r| !r.handle.is_finished()),
            Err(poisoned) => poisoned
                .into_inner()
                .as_ref()
                .is_some_and(|r| !r.handle.is_finished()),
        }
    }

    /// Run one sweep now, independent of the schedule.
    pub async fn sweep_now(&self) -> SweepReport {
        sweep_dirs(&self.config, SystemTime::now()).await
    }

    /// Run one sweep treating `now` as the current time.
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        sweep_dirs(&self.config, now).await
    }
}

#[tracing::instrument(skip(config), fields(cleanup.operation = "sweep"))]
async fn sweep_dirs(config: &SweepConfig, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();

    for dir in &config.dirs {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "Cleanup directory does not exist");
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, dir = %dir.display(), "Failed to list cleanup directory");
                report.failed += 1;
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, dir = %dir.display(), "Failed to read directory entry");
                    report.failed += 1;
                    break;
                }
            };

            let name = entry.file_name();
            if RESERVED_NAMES.iter().any(|r| name == *r) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(error = %e, file = ?name, "Failed to stat file");
                    report.failed += 1;
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            report.scanned += 1;

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(error = %e, file = ?name, "File has no modification time");
                    report.failed += 1;
                    continue;
                }
            };

            // Files from the future have age zero
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= config.max_age {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::debug!(file = ?name, age_secs = age.as_secs(), "Deleted stale file");
                    report.deleted += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(error = %e, file = ?name, "Failed to delete stale file");
                    report.failed += 1;
                }
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        deleted = report.deleted,
        failed = report.failed,
        "Cleanup completed"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scheduler(dirs: Vec<PathBuf>, max_age: Duration) -> CleanupScheduler {
        CleanupScheduler::new(SweepConfig {
            dirs,
            max_age,
            interval: Duration::from_secs(3600),
        })
    }

    fn mtime(path: &std::path::Path) -> SystemTime {
        std::fs::metadata(path).unwrap().modified().unwrap()
    }

    #[tokio::test]
    async fn test_age_boundary() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("staged.md");
        std::fs::write(&file, b"# x").unwrap();
        let max_age = Duration::from_secs(3600);
        let sweeper = scheduler(vec![dir.path().to_path_buf()], max_age);
        let written = mtime(&file);

        let report = sweeper.sweep_at(written + max_age).await;
        assert_eq!(report.deleted, 0);
        assert!(file.exists());

        let report = sweeper
            .sweep_at(written + max_age + Duration::from_millis(1))
            .await;
        assert_eq!(report.deleted, 1);
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_reserved_names_and_directories_are_kept() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), b"keep").unwrap();
        std::fs::write(dir.path().join(".gitkeep"), b"").unwrap();
        std::fs::create_dir(dir.path().join(".jobs")).unwrap();
        std::fs::write(dir.path().join("old.html"), b"<p>").unwrap();

        let sweeper = scheduler(vec![dir.path().to_path_buf()], Duration::from_secs(1));
        let far_future = SystemTime::now() + Duration::from_secs(86_400);
        let report = sweeper.sweep_at(far_future).await;

        assert_eq!(report.scanned, 1);
        assert_eq!(report.deleted, 1);
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join(".gitkeep").exists());
        assert!(dir.path().join(".jobs").is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        let sweeper = scheduler(
            vec![dir.path().join("does-not-exist"), dir.path().to_path_buf()],
            Duration::from_secs(1),
        );
        let report = sweeper.sweep_now().await;
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let sweeper = scheduler(vec![dir.path().to_path_buf()], Duration::from_secs(1));

        assert!(sweeper.start());
        assert!(!sweeper.start());
        assert!(sweeper.is_running());

        assert!(sweeper.stop().await);
        assert!(!sweeper.is_running());
        assert!(!sweeper.stop().await);

        assert!(sweeper.start());
        assert!(sweeper.stop().await);
    }

    #[tokio::test]
    async fn test_stop_when_never_started() {
        let sweeper = scheduler(vec![], Duration::from_secs(1));
        assert!(!sweeper.stop().await);
    }

    #[tokio::test]
    async fn test_first_sweep_runs_on_start() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("orphan.md");
        std::fs::write(&file, b"x").unwrap();
        let sweeper = scheduler(vec![dir.path().to_path_buf()], Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sweeper.start());
        for _ in 0..50 {
            if !file.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!file.exists());
        sweeper.stop().await;
    }
}
