//! HTTP download engine for streaming files to disk.
//!
//! This module provides functionality for downloading files from HTTP/HTTPS URLs
//! with streaming support to handle large files efficiently.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Bounded concurrency via a semaphore-backed worker pool
//! - Fixed-delay retries with a per-download attempt budget
//! - Cooperative cancellation of queued and in-flight downloads
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use batchfetch_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .download_to_path("https://example.com/paper.pdf", Path::new("downloads/paper.pdf"))
//!     .await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod cancel;
mod client;
pub mod constants;
mod engine;
mod error;
mod retry;

pub use cancel::CancellationToken;
pub use client::HttpClient;
pub use engine::{
    BatchReport, DEFAULT_MAX_WORKERS, DownloadEngine, DownloadStats, EngineError, JobOutcome,
};
pub use error::DownloadError;
pub use retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, RetryDecision, RetryPolicy};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
