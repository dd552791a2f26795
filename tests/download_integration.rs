//! Integration tests for the download module.
//!
//! These tests verify the full download flow with mock HTTP servers.

use std::path::Path;
use std::time::Duration;

use batchfetch_core::build_jobs;
use batchfetch_core::download::{DownloadError, HttpClient};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return socket_skip_return();
        };
        mock_server
    }};
}

/// Mounts a GET endpoint serving fixed bytes on the given mock server.
async fn mount_file(mock_server: &MockServer, path_str: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let mock_server = require_mock_server!();
    let content = b"This is the complete file content for testing.\nLine 2.\nLine 3.";
    mount_file(&mock_server, "/document.pdf", content).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("document.pdf");

    let client = HttpClient::new();
    let url = format!("{}/document.pdf", mock_server.uri());
    let result = client.download_to_path(&url, &destination).await;

    assert!(result.is_ok(), "Download should succeed: {:?}", result.err());
    assert_eq!(result.unwrap(), content.len() as u64);
    assert!(destination.exists(), "Downloaded file should exist");

    let downloaded_content = std::fs::read(&destination).expect("should read file");
    assert_eq!(
        downloaded_content, content,
        "Downloaded content should match original"
    );
}

#[tokio::test]
async fn test_download_writes_to_job_derived_path() {
    let mock_server = require_mock_server!();
    mount_file(&mock_server, "/papers/research-2024.pdf", b"content").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    // Destination comes from the job list: save_dir + URL basename
    let url = format!("{}/papers/research-2024.pdf", mock_server.uri());
    let jobs = build_jobs(&[url.clone()], temp_dir.path()).expect("URL should build a job");
    assert_eq!(
        jobs[0].destination_path,
        temp_dir.path().join("research-2024.pdf")
    );

    let client = HttpClient::new();
    let result = client.download_to_path(&url, &jobs[0].destination_path).await;

    assert!(result.is_ok());
    assert!(temp_dir.path().join("research-2024.pdf").exists());
}

#[tokio::test]
async fn test_download_handles_404_gracefully() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("missing.pdf");

    Mock::given(method("GET"))
        .and(path("/not-found"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let url = format!("{}/not-found", mock_server.uri());
    let result = client.download_to_path(&url, &destination).await;

    assert!(result.is_err());
    match result {
        Err(DownloadError::HttpStatus {
            status,
            url: err_url,
            ..
        }) => {
            assert_eq!(status, 404);
            assert!(err_url.contains("/not-found"));
        }
        other => panic!("Expected HttpStatus(404), got: {:?}", other),
    }
}

#[tokio::test]
async fn test_download_handles_500_error() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("error.bin");

    Mock::given(method("GET"))
        .and(path("/server-error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let url = format!("{}/server-error", mock_server.uri());
    let result = client.download_to_path(&url, &destination).await;

    assert!(result.is_err());
    match result {
        Err(DownloadError::HttpStatus { status, .. }) => {
            assert_eq!(status, 500);
        }
        other => panic!("Expected HttpStatus(500), got: {:?}", other),
    }
}

#[tokio::test]
async fn test_download_rejects_invalid_url() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let client = HttpClient::new();

    let result = client
        .download_to_path("definitely-not-a-url", &temp_dir.path().join("out.bin"))
        .await;

    assert!(result.is_err());
    assert!(
        matches!(result, Err(DownloadError::InvalidUrl { .. })),
        "Expected InvalidUrl, got: {:?}",
        result
    );
}

#[tokio::test]
async fn test_download_client_is_reusable() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_file(&mock_server, "/file1.txt", b"file1").await;
    mount_file(&mock_server, "/file2.txt", b"file2").await;

    let client = HttpClient::new();

    // Download first file
    let url1 = format!("{}/file1.txt", mock_server.uri());
    let path1 = temp_dir.path().join("file1.txt");
    let result1 = client.download_to_path(&url1, &path1).await;
    assert!(result1.is_ok());

    // Reuse same client for second download
    let url2 = format!("{}/file2.txt", mock_server.uri());
    let path2 = temp_dir.path().join("file2.txt");
    let result2 = client.download_to_path(&url2, &path2).await;
    assert!(result2.is_ok());

    // Verify both files exist with correct content
    assert_eq!(std::fs::read(&path1).unwrap(), b"file1");
    assert_eq!(std::fs::read(&path2).unwrap(), b"file2");
}

#[tokio::test]
async fn test_download_to_nonexistent_directory_fails() {
    let mock_server = require_mock_server!();
    mount_file(&mock_server, "/file.txt", b"content").await;
    let nonexistent = Path::new("/this/path/definitely/does/not/exist/anywhere/file.txt");

    let client = HttpClient::new();
    let url = format!("{}/file.txt", mock_server.uri());
    let result = client.download_to_path(&url, nonexistent).await;

    assert!(result.is_err());
    assert!(
        matches!(result, Err(DownloadError::Io { .. })),
        "Expected IO error, got: {:?}",
        result
    );
}

#[tokio::test]
async fn test_download_large_file_streams_byte_for_byte() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("large.bin");

    // ~1 MiB body with a non-repeating pattern so truncation or
    // reordering would be caught
    let large_content: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
    mount_file(&mock_server, "/large.bin", &large_content).await;

    let client = HttpClient::new();
    let url = format!("{}/large.bin", mock_server.uri());
    let result = client.download_to_path(&url, &destination).await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap(), large_content.len() as u64);
    let written = std::fs::read(&destination).expect("should read file");
    assert_eq!(written, large_content, "streamed bytes must match the body");
}

#[tokio::test]
async fn test_download_timeout_is_classified() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let destination = temp_dir.path().join("slow.bin");

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"data")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_options(Duration::from_secs(1), "batchfetch-test/0.0");
    let url = format!("{}/slow", mock_server.uri());
    let result = client.download_to_path(&url, &destination).await;

    assert!(
        matches!(result, Err(DownloadError::Timeout { .. })),
        "Expected Timeout, got: {:?}",
        result
    );
    assert!(
        !destination.exists(),
        "partial file must not remain after a failed attempt"
    );
}
