//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p panvert-api`. The converter is
//! replaced by [`FakeConverter`] so no pandoc installation is needed, except
//! for tests that explicitly ask for the real one.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use panvert_api::setup::{build_state, routes};
use panvert_api::AppState;
use panvert_core::Config;
use panvert_processing::{ConversionOutcome, ConversionRequest, DocumentConverter};
use panvert_storage::StagingArea;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const FAKE_VERSION: &str = "3.1.11";

#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Writes `<h1>converted</h1>` followed by the input to the output path
    Succeed,
    Fail(String),
    TimeOut,
}

/// Records every request and answers with a scripted outcome.
pub struct FakeConverter {
    behaviour: Behaviour,
    delay: Duration,
    available: bool,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl FakeConverter {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            delay: Duration::ZERO,
            available: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentConverter for FakeConverter {
    async fn convert(&self, request: &ConversionRequest) -> ConversionOutcome {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behaviour {
            Behaviour::Succeed => {
                let input = tokio::fs::read_to_string(&request.input)
                    .await
                    .unwrap_or_default();
                tokio::fs::write(&request.output, format!("<h1>converted</h1>\n{}", input))
                    .await
                    .unwrap();
                ConversionOutcome::Succeeded
            }
            Behaviour::Fail(diagnostic) => ConversionOutcome::Failed {
                diagnostic: diagnostic.clone(),
            },
            Behaviour::TimeOut => ConversionOutcome::TimedOut {
                after: Duration::from_secs(120),
            },
        }
    }

    async fn version(&self) -> Option<String> {
        self.available.then(|| FAKE_VERSION.to_string())
    }
}

/// Test application: server, state and owned directories.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub converter: Arc<FakeConverter>,
    pub upload_dir: TempDir,
    pub status_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_path(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Names currently in the staging directory.
    pub fn staged_files(&self) -> Vec<String> {
        staged_names(self.upload_dir.path())
    }

    /// Wait until the staging directory is empty, returning what remains otherwise.
    pub async fn wait_for_empty_staging(&self) -> Vec<String> {
        for _ in 0..50 {
            let names = self.staged_files();
            if names.is_empty() {
                return names;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.staged_files()
    }
}

pub fn staged_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Setup a test app around `converter` with default limits.
pub async fn setup_test_app(converter: FakeConverter) -> TestApp {
    setup_test_app_with(converter, &[]).await
}

/// Setup a test app with extra configuration variables.
pub async fn setup_test_app_with(converter: FakeConverter, vars: &[(&str, &str)]) -> TestApp {
    let upload_dir = TempDir::new().unwrap();
    let status_dir = TempDir::new().unwrap();
    let converter = Arc::new(converter);

    let (state, router) =
        build_app(upload_dir.path(), status_dir.path(), converter.clone(), vars).await;
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        converter,
        upload_dir,
        status_dir,
    }
}

pub async fn build_app(
    upload_dir: &Path,
    status_dir: &Path,
    converter: Arc<dyn DocumentConverter>,
    vars: &[(&str, &str)],
) -> (Arc<AppState>, axum::Router) {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("UPLOAD_DIR".into(), upload_dir.display().to_string());
    env.insert("STATUS_DIR".into(), status_dir.display().to_string());
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();

    let staging = StagingArea::new(PathBuf::from(upload_dir)).await.unwrap();
    let state = build_state(config.clone(), converter, staging).await.unwrap();
    let router = routes::setup_routes(&config, state.clone());
    (state, router)
}

pub fn markdown_part(name: &str, body: &str) -> Part {
    Part::bytes(bytes::Bytes::from(body.as_bytes().to_vec()))
        .file_name(name)
        .mime_type("text/markdown")
}

pub fn markdown_form(body: &str) -> MultipartForm {
    MultipartForm::new().add_part("file", markdown_part("notes.md", body))
}
