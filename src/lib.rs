//! Batchfetch Core Library
//!
//! This library provides the core functionality for the batchfetch tool,
//! which fetches a fixed list of remote files into a local directory using
//! a bounded pool of concurrent workers with per-download retries.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Configuration file loading and settings resolution
//! - [`download`] - HTTP download engine with streaming support
//! - [`input`] - URL list parsing from files and stdin
//! - [`jobs`] - Download job construction from raw URLs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod input;
pub mod jobs;

pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use download::{
    BatchReport, CancellationToken, DEFAULT_MAX_WORKERS, DownloadEngine, DownloadError,
    DownloadStats, EngineError, HttpClient, JobOutcome, RetryDecision, RetryPolicy,
};
pub use jobs::{DownloadJob, build_jobs};
