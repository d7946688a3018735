//! Synchronous conversion integration tests.
//!
//! Run with: `cargo test -p panvert-api --test convert_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{markdown_form, markdown_part, setup_test_app, setup_test_app_with, Behaviour, FakeConverter};
use panvert_core::formats::DEST_FORMATS;
use panvert_processing::build_args;
use serde_json::Value;

#[tokio::test]
async fn test_convert_markdown_to_html() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;
    let client = app.client();

    let response = client
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form("# Title\n"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/html");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"converted.html\""
    );
    assert_eq!(response.header("cache-control"), "no-store");
    assert_eq!(response.text(), "<h1>converted</h1>\n# Title\n");

    let requests = app.converter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].dest.id(), "html");
    assert_eq!(requests[0].source.map(|s| s.id()), Some("markdown"));
}

#[tokio::test]
async fn test_convert_headers_follow_format_registry() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;
    let client = app.client();

    for format in DEST_FORMATS.iter() {
        let response = client
            .post(&format!("/api/convert?from=markdown&to={}", format.id))
            .multipart(markdown_form("body"))
            .await;

        assert_eq!(response.status_code(), 200, "dest {}", format.id);
        assert_eq!(response.header("content-type"), format.mime_type);
        assert_eq!(
            response.header("content-disposition"),
            format!("attachment; filename=\"converted.{}\"", format.extension)
        );
    }
}

#[tokio::test]
async fn test_gfm_is_served_as_plain_markdown() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=gfm")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/plain");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"converted.md\""
    );
}

#[tokio::test]
async fn test_convert_leaves_staging_empty() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form("# Title\n"))
        .await;
    assert_eq!(response.status_code(), 200);

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_convert_rejects_unknown_destination() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=unknownformat")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_FORMAT");
    assert!(app.converter.requests().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_convert_requires_formats() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?to=html")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["error"], "Missing required field: 'from'");
}

#[tokio::test]
async fn test_convert_requires_file() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["error"], "Missing required field: 'file'");
}

#[tokio::test]
async fn test_convert_accepts_indexed_file_field() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let form = MultipartForm::new().add_part("files[0]", markdown_part("notes.md", "# Indexed\n"));
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("# Indexed"));
}

#[tokio::test]
async fn test_convert_rejects_out_of_range_toc_depth() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html&toc=true&tocDepth=9")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(app.converter.requests().is_empty());
}

#[tokio::test]
async fn test_convert_passes_options_to_converter() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=gfm&to=html&toc=true&tocDepth=2&numberSections=true")
        .multipart(markdown_form("body"))
        .await;
    assert_eq!(response.status_code(), 200);

    let request = &app.converter.requests()[0];
    assert!(request.options.toc);
    assert_eq!(request.options.toc_depth.map(|d| d.get()), Some(2));
    assert!(request.options.number_sections);
    assert!(!request.options.no_yaml);
}

#[tokio::test]
async fn test_template_ignored_for_html() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let form = markdown_form("body").add_part(
        "template",
        Part::bytes(bytes::Bytes::from_static(b"PK fake docx")).file_name("reference.docx"),
    );
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);

    let request = &app.converter.requests()[0];
    assert!(request.template.is_none());
    let args = build_args(request, "xelatex");
    assert!(!args.iter().any(|a| a.to_string_lossy().starts_with("--reference-doc")));

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_template_used_for_docx() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let form = markdown_form("body").add_part(
        "template",
        Part::bytes(bytes::Bytes::from_static(b"PK fake docx")).file_name("reference.docx"),
    );
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=docx")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);

    let request = &app.converter.requests()[0];
    let template = request.template.as_ref().expect("template should be passed");
    assert_eq!(template.extension().and_then(|e| e.to_str()), Some("docx"));
    let args = build_args(request, "xelatex");
    assert!(args.iter().any(|a| a.to_string_lossy().starts_with("--reference-doc")));
}

#[tokio::test]
async fn test_conversion_failure_returns_diagnostic() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Fail(
        "Error parsing YAML metadata at line 3".to_string(),
    )))
    .await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form("---\ntitle: [\n---\n"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONVERSION_FAILED");
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("YAML metadata"));
    assert!(message.contains("noYaml=true"));

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_yaml_hint_omitted_when_no_yaml_set() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Fail(
        "Error parsing YAML metadata".to_string(),
    )))
    .await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html&noYaml=true")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert!(!body["error"].as_str().unwrap().contains("noYaml=true"));
}

#[tokio::test]
async fn test_conversion_timeout_returns_504() {
    let app = setup_test_app(FakeConverter::new(Behaviour::TimeOut)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=pdf")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 504);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONVERSION_TIMEOUT");
    assert_eq!(body["error"], "Conversion timed out after 120 seconds");
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let app = setup_test_app_with(
        FakeConverter::new(Behaviour::Succeed),
        &[("MAX_FILE_SIZE_MB", "1"), ("MAX_TOTAL_SIZE_MB", "2")],
    )
    .await;

    let big = "a".repeat(2 * 1024 * 1024);
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form(&big))
        .await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["code"], "FILE_TOO_LARGE");
    assert!(app.converter.requests().is_empty());

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_get_on_convert_is_method_not_allowed() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app.client().get("/api/convert").await;

    assert_eq!(response.status_code(), 405);
    let body: Value = response.json();
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app.client().get("/api/nothing-here").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_text_part_named_file_is_not_a_document() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let form = MultipartForm::new().add_text("file", "# hi");
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["error"], "Missing required field: 'file'");
    assert!(app.converter.requests().is_empty());
}

#[tokio::test]
async fn test_file_and_template_share_total_limit() {
    let app = setup_test_app_with(
        FakeConverter::new(Behaviour::Succeed),
        &[("MAX_FILE_SIZE_MB", "1"), ("MAX_TOTAL_SIZE_MB", "1")],
    )
    .await;

    // Each part fits the per-file limit; together they exceed the total.
    let form = markdown_form(&"a".repeat(700 * 1024)).add_part(
        "template",
        Part::bytes(bytes::Bytes::from(vec![b'P'; 700 * 1024])).file_name("reference.docx"),
    );
    let response = app
        .client()
        .post("/api/convert?from=markdown&to=docx")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["code"], "FILE_TOO_LARGE");
    assert!(app.converter.requests().is_empty());

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_slow_request_times_out_with_json_body() {
    let converter = FakeConverter::new(Behaviour::Succeed).with_delay(std::time::Duration::from_secs(5));
    let app = setup_test_app_with(converter, &[("REQUEST_TIMEOUT_SECS", "1")]).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=html")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 408);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "REQUEST_TIMEOUT");
    assert_eq!(body["error"], "Request timed out after 1 seconds");

    let remaining = app.wait_for_empty_staging().await;
    assert!(remaining.is_empty(), "left behind: {:?}", remaining);
}

#[tokio::test]
async fn test_error_details_shown_outside_production() {
    let app = setup_test_app(FakeConverter::new(Behaviour::Succeed)).await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=unknownformat")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["details"].as_str().unwrap().contains("unknownformat"));
}

#[tokio::test]
async fn test_error_details_hidden_in_production() {
    let app = setup_test_app_with(
        FakeConverter::new(Behaviour::Succeed),
        &[
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://docs.example.com"),
        ],
    )
    .await;

    let response = app
        .client()
        .post("/api/convert?from=markdown&to=unknownformat")
        .multipart(markdown_form("body"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_FORMAT");
    assert!(body.get("details").is_none());
}
