//! Download job construction from raw URLs.
//!
//! A [`DownloadJob`] pairs a source URL with the local path the file will be
//! written to. Jobs are built up front by [`build_jobs`], which validates
//! every URL before anything is dispatched: a single bad URL rejects the
//! whole batch instead of surfacing halfway through a run.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::download::DownloadError;

/// A single unit of download work.
///
/// Jobs are immutable once built: the destination is derived from the URL
/// path exactly once, so every retry of the job writes to the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// The URL to fetch.
    pub source_url: String,
    /// The local file path the body is written to.
    pub destination_path: PathBuf,
}

/// Builds download jobs for `urls`, placing each file under `save_dir`.
///
/// The destination file name is the last segment of the URL path, used
/// verbatim (query strings and fragments are ignored, percent-encoding is
/// preserved). URLs are rejected when they are malformed, use a scheme other
/// than http/https, or have no non-empty final path segment to name the
/// file after.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use batchfetch_core::jobs::build_jobs;
///
/// let urls = vec!["https://example.com/data/report.pdf".to_string()];
/// let jobs = build_jobs(&urls, Path::new("downloads"))?;
/// assert_eq!(jobs[0].destination_path, Path::new("downloads/report.pdf"));
/// # Ok::<(), batchfetch_core::DownloadError>(())
/// ```
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] for the first URL that cannot be
/// turned into a job. No filesystem access happens here; collisions between
/// two URLs with the same file name are not an error (the later download
/// overwrites the earlier one).
pub fn build_jobs(urls: &[String], save_dir: &Path) -> Result<Vec<DownloadJob>, DownloadError> {
    let mut jobs = Vec::with_capacity(urls.len());

    for url in urls {
        let parsed =
            Url::parse(url).map_err(|_| DownloadError::invalid_url(url, "malformed URL"))?;

        let scheme = parsed.scheme();
        if !matches!(scheme, "http" | "https") {
            return Err(DownloadError::invalid_url(
                url,
                format!("unsupported scheme '{scheme}'"),
            ));
        }

        let Some(file_name) = file_name_from_url(&parsed) else {
            return Err(DownloadError::invalid_url(
                url,
                "no file name in URL path",
            ));
        };

        jobs.push(DownloadJob {
            source_url: url.clone(),
            destination_path: save_dir.join(file_name),
        });
    }

    debug!(count = jobs.len(), "built download jobs");
    Ok(jobs)
}

/// Extracts the last non-empty path segment of a URL.
fn file_name_from_url(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
}
