//! End-to-end conversion through a real pandoc binary.
//!
//! Run with: `cargo test -p panvert-api --test pandoc_test`
//! Skipped when pandoc is not on PATH.

mod helpers;

use axum_test::TestServer;
use helpers::{build_app, markdown_form};
use panvert_processing::{DocumentConverter, PandocConverter};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_markdown_to_html_with_pandoc() {
    let upload_dir = TempDir::new().unwrap();
    let status_dir = TempDir::new().unwrap();
    let converter = PandocConverter::new(
        "pandoc",
        "xelatex",
        Duration::from_secs(30),
        upload_dir.path(),
    );
    if converter.version().await.is_none() {
        eprintln!("pandoc not installed, skipping");
        return;
    }

    let (_state, router) =
        build_app(upload_dir.path(), status_dir.path(), Arc::new(converter), &[]).await;
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    let response = server
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form("# Hello\n\nSome **bold** text.\n"))
        .await;

    assert_eq!(response.status_code(), 200);
    let html = response.text();
    assert!(html.contains("<h1"));
    assert!(html.contains("<strong>bold</strong>"));
}

#[tokio::test]
async fn test_health_reports_pandoc_version() {
    let upload_dir = TempDir::new().unwrap();
    let status_dir = TempDir::new().unwrap();
    let converter = PandocConverter::new(
        "pandoc",
        "xelatex",
        Duration::from_secs(30),
        upload_dir.path(),
    );
    let Some(version) = converter.version().await else {
        eprintln!("pandoc not installed, skipping");
        return;
    };

    let (_state, router) =
        build_app(upload_dir.path(), status_dir.path(), Arc::new(converter), &[]).await;
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["pandoc"], version.as_str());
}
