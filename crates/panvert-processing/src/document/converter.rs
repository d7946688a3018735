use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::args::{build_args, ConversionRequest};
use super::diagnostics::sanitize_diagnostic;

/// Result of one converter invocation. Invocation never fails with an error;
/// every problem is folded into one of these outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Succeeded,
    /// Non-zero exit or the process could not be started
    Failed { diagnostic: String },
    /// The process exceeded the time limit and was killed
    TimedOut { after: Duration },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Succeeded)
    }
}

/// Seam between request handling and the external converter.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, request: &ConversionRequest) -> ConversionOutcome;

    /// Converter version string, `None` if it cannot be run.
    async fn version(&self) -> Option<String>;
}

/// Runs pandoc as a child process.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    pandoc_path: String,
    pdf_engine: String,
    timeout: Duration,
    staging_dir: PathBuf,
}

impl PandocConverter {
    pub fn new(
        pandoc_path: impl Into<String>,
        pdf_engine: impl Into<String>,
        timeout: Duration,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pandoc_path: pandoc_path.into(),
            pdf_engine: pdf_engine.into(),
            timeout,
            staging_dir: staging_dir.into(),
        }
    }

    fn program_name(&self) -> String {
        Path::new(&self.pandoc_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.pandoc_path.clone())
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    #[tracing::instrument(skip(self, request), fields(dest = request.dest.id()))]
    async fn convert(&self, request: &ConversionRequest) -> ConversionOutcome {
        let args = build_args(request, &self.pdf_engine);
        tracing::debug!(?args, "Running converter");

        let child = Command::new(&self.pandoc_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(error = %e, program = %self.pandoc_path, "Failed to start converter");
                return ConversionOutcome::Failed {
                    diagnostic: format!("failed to start {}: {}", self.program_name(), e),
                };
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to wait for converter");
                return ConversionOutcome::Failed {
                    diagnostic: format!("{} did not complete: {}", self.program_name(), e),
                };
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Converter timed out");
                return ConversionOutcome::TimedOut {
                    after: self.timeout,
                };
            }
        };

        if output.status.success() {
            tracing::info!("Conversion successful");
            return ConversionOutcome::Succeeded;
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = sanitize_diagnostic(&stderr, &self.staging_dir);
        let diagnostic = if diagnostic.is_empty() {
            match output.status.code() {
                Some(code) => format!("{} exited with code {}", self.program_name(), code),
                None => format!("{} was terminated by a signal", self.program_name()),
            }
        } else {
            diagnostic
        };

        tracing::warn!(
            exit_code = ?output.status.code(),
            diagnostic = %diagnostic,
            "Conversion failed"
        );
        ConversionOutcome::Failed { diagnostic }
    }

    async fn version(&self) -> Option<String> {
        let output = Command::new(&self.pandoc_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_secs(5), output).await {
            Ok(Ok(output)) if output.status.success() => output,
            _ => return None,
        };

        // A converter that runs but prints an unfamiliar banner is still usable.
        Some(
            parse_version(&String::from_utf8_lossy(&output.stdout))
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        )
    }
}

const UNKNOWN_VERSION: &str = "unknown";

/// Extract `X.Y.Z` from a `pandoc X.Y.Z` banner line.
fn parse_version(banner: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?i)^pandoc(?:\.exe)?\s+([\d.]+)").ok()?;
    let first_line = banner.lines().next()?;
    re.captures(first_line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
