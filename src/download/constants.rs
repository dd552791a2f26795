//! Constants for the download module (timeouts, buffering, destination).

/// Default whole-request timeout for a single download attempt (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default directory that downloaded files are written into.
pub const DEFAULT_SAVE_DIR: &str = "downloads";

/// Buffer size for streaming response bodies to disk (8 KiB).
pub const WRITE_BUFFER_SIZE: usize = 8192;
