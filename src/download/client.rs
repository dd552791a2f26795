//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with proper timeout configuration and error handling.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, WRITE_BUFFER_SIZE};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use batchfetch_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client
///     .download_to_path("https://example.com/file.pdf", Path::new("downloads/file.pdf"))
///     .await?;
/// println!("Downloaded {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default timeout and User-Agent.
    ///
    /// Default configuration:
    /// - Whole-request timeout: 30 seconds
    /// - Gzip decompression: enabled
    /// - User-Agent: `batchfetch/<version>`
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_options(
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            &user_agent::default_user_agent(),
        )
    }

    /// Creates a new HTTP client with an explicit timeout and User-Agent.
    ///
    /// The timeout bounds the whole request: connect, headers, and body
    /// transfer all count against the same deadline.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_options(request_timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Downloads a file from `url` to `destination`.
    ///
    /// The destination file is created (or truncated, if a previous attempt
    /// left one behind) and the response body is streamed into it in buffered
    /// chunks, so large files never reside fully in memory.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to download from
    /// * `destination` - The exact file path to write to
    ///
    /// # Returns
    ///
    /// The number of bytes written to `destination`.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[must_use = "download result reports the bytes written"]
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_to_path(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        debug!("starting download");

        // Validate URL
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url, "malformed URL"))?;

        let response = self.send_request(url).await?;

        // Create/truncate per attempt so a retried download never appends
        // to bytes left by a failed one.
        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination.to_path_buf(), e))?;

        // Stream response body to file, with cleanup on error
        let stream_result = stream_to_file(&mut file, response, url, destination).await;

        if stream_result.is_err() {
            debug!(path = %destination.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(destination).await;
        }

        let bytes_written = stream_result?;

        info!(
            path = %destination.display(),
            bytes = bytes_written,
            "download complete"
        );

        Ok(bytes_written)
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
