//! Download engine for concurrent file downloads with retry support.
//!
//! This module provides the `DownloadEngine` which coordinates concurrent
//! downloads using a semaphore-based concurrency control pattern, with
//! automatic retry on failed attempts.
//!
//! # Overview
//!
//! The engine processes a fixed list of [`DownloadJob`]s, fetching each one
//! using an [`HttpClient`], with a configurable worker limit and retry
//! policy. Every job ends in exactly one [`JobOutcome`], collected into a
//! [`BatchReport`] together with run statistics.
//!
//! # Example
//!
//! ```no_run
//! use batchfetch_core::download::{DownloadEngine, HttpClient, RetryPolicy};
//! use batchfetch_core::jobs::build_jobs;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = vec!["https://example.com/file.pdf".to_string()];
//! let jobs = build_jobs(&urls, Path::new("./downloads"))?;
//! let engine = DownloadEngine::new(5, RetryPolicy::default())?;
//! let client = HttpClient::new();
//! let report = engine.process_jobs(jobs, &client).await?;
//! println!(
//!     "Completed: {}, Failed: {}, Retried: {}",
//!     report.stats.completed(),
//!     report.stats.failed(),
//!     report.stats.retried()
//! );
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::cancel::CancellationToken;
use super::retry::{RetryDecision, RetryPolicy};
use super::{DownloadError, HttpClient};
use crate::jobs::DownloadJob;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 64;

/// Default worker count if not specified.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Terminal state of a single download job.
///
/// Every job processed by the engine ends in exactly one of these states;
/// nothing is retried or resumed after the batch returns.
#[derive(Debug)]
pub enum JobOutcome {
    /// The file was downloaded and written to its destination.
    Succeeded {
        /// How many attempts were used (1 = first try).
        attempts: u32,
        /// Bytes written to the destination file.
        bytes_written: u64,
    },

    /// Every attempt failed; the last error is reported.
    FailedAfterRetries {
        /// How many attempts were made.
        attempts: u32,
        /// The error from the final attempt.
        error: DownloadError,
    },

    /// The job was skipped or aborted because the run was cancelled.
    Cancelled,
}

impl JobOutcome {
    /// Returns true if the job completed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns true if the job failed after exhausting its attempts.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FailedAfterRetries { .. })
    }

    /// Returns true if the job was cancelled before completing.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Statistics from a download batch run.
///
/// Tracks the number of completed, failed, cancelled, and retried downloads
/// during a `process_jobs()` invocation. Uses atomic counters for
/// thread-safe updates from concurrent download tasks.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successfully completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the number of downloads skipped or aborted by cancellation.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the total number of jobs processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed() + self.cancelled()
    }

    /// Returns the number of retry attempts made.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Increments the completed counter.
    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the failed counter.
    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the cancelled counter.
    fn increment_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the retried counter.
    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }
}

/// Result of processing a batch of download jobs.
#[derive(Debug)]
pub struct BatchReport {
    /// One terminal outcome per job. Order follows task completion, not the
    /// order the jobs were submitted in.
    pub outcomes: Vec<(DownloadJob, JobOutcome)>,
    /// Aggregate counters for the run.
    pub stats: DownloadStats,
}

/// Download engine for concurrent file downloads with retry support.
///
/// The engine uses a semaphore to limit the number of concurrent downloads,
/// preventing resource exhaustion. Failed downloads are automatically
/// retried with a fixed delay until the attempt budget is exhausted.
///
/// # Concurrency Model
///
/// - Each download runs in its own Tokio task
/// - A semaphore permit is acquired before starting each download
/// - Permits are released automatically when downloads complete (RAII)
/// - At most `min(max_workers, jobs.len())` downloads are in flight at once
///
/// # Retry Behavior
///
/// - Every failure consumes one attempt from the same budget; there is no
///   error classification
/// - The delay between attempts is fixed, and no delay follows the final
///   failed attempt
/// - A job that exhausts its attempts reports the error from the last one
///
/// # Cancellation
///
/// - `process_jobs_cancellable` checks a [`CancellationToken`] before
///   dispatching each job and races it against in-flight transfers
/// - Cancelled jobs report [`JobOutcome::Cancelled`]; partial files from
///   aborted transfers are removed
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured worker limit.
    max_workers: usize,
    /// Retry policy for failed downloads.
    retry_policy: RetryPolicy,
}

impl DownloadEngine {
    /// Creates a new download engine with the specified worker limit and
    /// retry policy.
    ///
    /// # Arguments
    ///
    /// * `max_workers` - Maximum number of concurrent downloads (1-64)
    /// * `retry_policy` - Policy for retrying failed downloads
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] if the value is outside
    /// the valid range (1-64).
    ///
    /// # Example
    ///
    /// ```
    /// use batchfetch_core::download::{DownloadEngine, RetryPolicy};
    ///
    /// let engine = DownloadEngine::new(5, RetryPolicy::default()).unwrap();
    /// ```
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(max_workers: usize, retry_policy: RetryPolicy) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&max_workers) {
            return Err(EngineError::InvalidWorkerCount { value: max_workers });
        }

        debug!(
            max_workers,
            max_attempts = retry_policy.max_attempts(),
            retry_delay_ms = retry_policy.delay().as_millis(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            retry_policy,
        })
    }

    /// Returns the configured worker limit.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Processes all jobs concurrently, without external cancellation.
    ///
    /// # Errors
    ///
    /// Returns the same errors as
    /// [`process_jobs_cancellable`](Self::process_jobs_cancellable).
    pub async fn process_jobs(
        &self,
        jobs: Vec<DownloadJob>,
        client: &HttpClient,
    ) -> Result<BatchReport, EngineError> {
        self.process_jobs_cancellable(jobs, client, &CancellationToken::new())
            .await
    }

    /// Processes all jobs concurrently, honoring a cancellation token.
    ///
    /// This method:
    /// 1. Dispatches jobs in order, up to the worker limit
    /// 2. Retries failed attempts with a fixed delay
    /// 3. Skips queued jobs and aborts in-flight transfers once `cancel` fires
    /// 4. Returns one terminal outcome per job when everything settles
    ///
    /// # Arguments
    ///
    /// * `jobs` - The download jobs to process
    /// * `client` - HTTP client for downloads
    /// * `cancel` - Token that aborts the remainder of the run when cancelled
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    ///
    /// Note: Individual download failures do NOT cause this method to error.
    /// Failed downloads are reported through their [`JobOutcome`] and counted
    /// in stats.
    #[instrument(skip(self, jobs, client, cancel), fields(jobs = jobs.len()))]
    pub async fn process_jobs_cancellable(
        &self,
        jobs: Vec<DownloadJob>,
        client: &HttpClient,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, EngineError> {
        let stats = Arc::new(DownloadStats::new());
        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut handles = Vec::new();

        info!("starting batch processing");

        for job in jobs {
            if cancel.is_cancelled() {
                debug!(url = %job.source_url, "skipping queued job after cancellation");
                stats.increment_cancelled();
                outcomes.push((job, JobOutcome::Cancelled));
                continue;
            }

            // Acquire semaphore permit (blocks if at the worker limit),
            // racing against cancellation so a full pool cannot stall shutdown
            let permit = tokio::select! {
                permit = self.semaphore.clone().acquire_owned() => {
                    permit.map_err(|_| EngineError::SemaphoreClosed)?
                }
                () = cancel.cancelled() => {
                    debug!(url = %job.source_url, "skipping queued job after cancellation");
                    stats.increment_cancelled();
                    outcomes.push((job, JobOutcome::Cancelled));
                    continue;
                }
            };

            debug!(url = %job.source_url, "dispatching job");

            // Clone values for the spawned task
            let client = client.clone();
            let stats = Arc::clone(&stats);
            let retry_policy = self.retry_policy.clone();
            let cancel = cancel.clone();

            // Spawn download task with retry logic
            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;

                let outcome = tokio::select! {
                    result = download_with_retry(&client, &job, &retry_policy, &stats) => {
                        match result {
                            Ok((attempts, bytes_written)) => {
                                info!(
                                    url = %job.source_url,
                                    path = %job.destination_path.display(),
                                    attempts,
                                    bytes = bytes_written,
                                    "download succeeded"
                                );
                                stats.increment_completed();
                                JobOutcome::Succeeded {
                                    attempts,
                                    bytes_written,
                                }
                            }
                            Err((error, attempts)) => {
                                warn!(
                                    url = %job.source_url,
                                    error = %error,
                                    attempts,
                                    "download failed after all attempts"
                                );
                                stats.increment_failed();
                                JobOutcome::FailedAfterRetries { attempts, error }
                            }
                        }
                    }
                    () = cancel.cancelled() => {
                        // The in-flight transfer is dropped here; remove
                        // whatever it had written so far
                        info!(url = %job.source_url, "download cancelled");
                        let _ = tokio::fs::remove_file(&job.destination_path).await;
                        stats.increment_cancelled();
                        JobOutcome::Cancelled
                    }
                };

                (job, outcome)
            }));
        }

        debug!(
            task_count = handles.len(),
            "waiting for downloads to complete"
        );

        // Wait for all tasks to settle
        for handle in handles {
            match handle.await {
                Ok(pair) => outcomes.push(pair),
                // Task panics are logged but don't fail the batch
                Err(e) => warn!(error = %e, "download task panicked"),
            }
        }

        let completed = stats.completed();
        let failed = stats.failed();
        let cancelled = stats.cancelled();
        let retried = stats.retried();
        info!(
            completed,
            failed,
            cancelled,
            retried,
            total = completed + failed + cancelled,
            "batch processing complete"
        );

        // We need to return the stats, but we have an Arc.
        // Since all tasks are done, we should have sole ownership.
        // If not (which would be a bug), create new stats from the atomic values.
        let stats = match Arc::try_unwrap(stats) {
            Ok(stats) => stats,
            Err(arc_stats) => {
                let new_stats = DownloadStats::new();
                new_stats
                    .completed
                    .store(arc_stats.completed(), Ordering::SeqCst);
                new_stats.failed.store(arc_stats.failed(), Ordering::SeqCst);
                new_stats
                    .cancelled
                    .store(arc_stats.cancelled(), Ordering::SeqCst);
                new_stats
                    .retried
                    .store(arc_stats.retried(), Ordering::SeqCst);
                new_stats
            }
        };

        Ok(BatchReport { outcomes, stats })
    }
}

/// Downloads one job, retrying failed attempts until the budget is spent.
///
/// Attempts are tracked in-memory during the retry loop. Only the final
/// error and attempt count are returned if all attempts are exhausted; no
/// delay is inserted after the final failure.
///
/// # Returns
///
/// - `Ok((attempts, bytes_written))` - Attempt count and file size on success
/// - `Err((DownloadError, attempts))` - Final error and attempt count on failure
#[instrument(skip(client, job, policy, stats), fields(url = %job.source_url))]
async fn download_with_retry(
    client: &HttpClient,
    job: &DownloadJob,
    policy: &RetryPolicy,
    stats: &DownloadStats,
) -> Result<(u32, u64), (DownloadError, u32)> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!(attempt, max_attempts = policy.max_attempts(), "attempting download");

        match client
            .download_to_path(&job.source_url, &job.destination_path)
            .await
        {
            Ok(bytes_written) => return Ok((attempt, bytes_written)),
            Err(e) => match policy.should_retry(attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        url = %job.source_url,
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "retrying download"
                    );
                    stats.increment_retried();
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url = %job.source_url, %reason, "not retrying download");
                    return Err((e, attempt));
                }
            },
        }
    }
}
