//! Retry logic for failed download attempts.
//!
//! This module provides the [`RetryPolicy`] type, which decides whether a
//! failed download attempt should be retried.
//!
//! # Overview
//!
//! Every failure is treated alike: network errors, timeouts, HTTP error
//! statuses, and file system errors all consume one attempt from the same
//! budget. The policy retries with a fixed delay between attempts (no
//! backoff growth) until the budget is exhausted, then reports the last
//! error to the caller.
//!
//! # Example
//!
//! ```
//! use batchfetch_core::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//!
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

/// Default maximum attempts per download (including the initial attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts (2 seconds).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Decision on whether to retry a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the download after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the download.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: 2 seconds
///
/// The delay is fixed: attempt 2 waits as long as attempt 3. No delay is
/// inserted after the final failed attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Fixed delay between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (must be >= 1)
    /// * `delay` - Fixed delay between attempts
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Creates a policy with a custom `max_attempts`, using the default delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Determines whether to retry a failed download.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that just failed (1-indexed)
    ///
    /// # Returns
    ///
    /// A [`RetryDecision`] indicating whether to retry and with what delay.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = self.delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}
