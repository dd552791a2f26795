//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use batchfetch_core::config::SettingsOverrides;

/// Fetch a fixed list of remote files with bounded concurrency and retries.
///
/// URLs are given as arguments, via `--input <FILE>`, or piped on stdin
/// (one per line; blank lines and `#` comments ignored). Each file is
/// saved under the save directory, named by the last path segment of its
/// URL. Flags override the config file, which overrides built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "batchfetch")]
#[command(author, version, about)]
#[command(after_help = "Exit codes:
  0   = all downloads succeeded
  1   = one or more downloads failed
  2   = usage or configuration error
  130 = interrupted")]
pub struct Args {
    /// URLs to download
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read URLs from a file, one per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Use an explicit config file instead of the default path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory downloaded files are written into
    #[arg(short = 'o', long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-64)
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub max_workers: Option<u8>,

    /// Attempts per download, including the first (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: Option<u8>,

    /// Seconds to wait between attempts (0-300)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(0..=300))]
    pub retry_delay: Option<u64>,

    /// Whole-request timeout per attempt in seconds (1-3600)
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "STRING")]
    pub user_agent: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Maps the value flags onto the settings-override layer.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            save_dir: self.save_dir.clone(),
            max_workers: self.max_workers,
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay,
            request_timeout_secs: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}
