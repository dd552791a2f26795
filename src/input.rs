//! URL list acquisition from positional arguments, list files, and stdin.
//!
//! The list format is one URL per line: surrounding whitespace is trimmed,
//! blank lines and lines starting with `#` are skipped. No URL validation
//! happens here; [`crate::jobs::build_jobs`] rejects malformed entries.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Parses the line-oriented URL list format.
///
/// Each line is trimmed; blank lines and `#` comment lines are skipped.
/// Order is preserved and duplicates pass through untouched.
#[must_use]
pub fn parse_url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Reads a URL list file in the format of [`parse_url_lines`].
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read.
pub fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list '{}'", path.display()))?;
    Ok(parse_url_lines(&raw))
}

/// Assembles the ordered URL list for one run.
///
/// Positional URLs come first, then the lines of the `--input` file.
/// `stdin_text` is consulted only when neither positional URLs nor a list
/// file were given; the caller is expected to read stdin only when it is
/// piped, so a terminal run never blocks here.
///
/// # Errors
///
/// Returns an error if the list file cannot be read.
pub fn collect_urls(
    positional: &[String],
    input_file: Option<&Path>,
    stdin_text: Option<&str>,
) -> Result<Vec<String>> {
    let mut urls: Vec<String> = positional.to_vec();

    if let Some(path) = input_file {
        let from_file = read_url_file(path)?;
        debug!(path = %path.display(), count = from_file.len(), "read URL list file");
        urls.extend(from_file);
    }

    if positional.is_empty()
        && input_file.is_none()
        && let Some(text) = stdin_text
    {
        urls = parse_url_lines(text);
        debug!(count = urls.len(), "read URL list from stdin");
    }

    Ok(urls)
}
