//! CLI entry point for the batchfetch tool.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use batchfetch_core::config::{self, Settings};
use batchfetch_core::{
    BatchReport, CancellationToken, DownloadEngine, HttpClient, JobOutcome, RetryPolicy,
    build_jobs, input,
};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

/// Guidance printed when no URLs were supplied at all.
const NO_INPUT_GUIDANCE: &str =
    "No URLs given. Pass them as arguments, use --input <FILE>, or pipe them on stdin.";

/// Example invocation shown with the guidance.
const INPUT_EXAMPLE: &str = "Example: batchfetch https://example.com/file.pdf";

/// Process exit outcome for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Every job succeeded.
    Success,
    /// At least one job failed after exhausting its attempts.
    Failed,
    /// The run was interrupted before every job could finish.
    Interrupted,
}

impl ProcessExit {
    fn code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Failed => ExitCode::from(1),
            Self::Interrupted => ExitCode::from(130),
        }
    }
}

/// Maps batch outcome counts to the process exit outcome.
fn determine_exit_outcome(failed: usize, cancelled: usize) -> ProcessExit {
    if cancelled > 0 {
        ProcessExit::Interrupted
    } else if failed > 0 {
        ProcessExit::Failed
    } else {
        ProcessExit::Success
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(exit) => exit.code(),
        Err(e) => {
            // Startup and configuration problems; nothing was downloaded
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    info!("batchfetch starting");

    let settings = resolve_settings(&args)?;
    debug!(
        save_dir = %settings.save_dir.display(),
        max_workers = settings.max_workers,
        max_retries = settings.max_retries,
        retry_delay_secs = settings.retry_delay.as_secs(),
        request_timeout_secs = settings.request_timeout.as_secs(),
        user_agent = %settings.user_agent,
        "effective settings"
    );

    // Collect URLs from arguments, --input, or piped stdin
    let urls = acquire_urls(&args)?;
    if urls.is_empty() {
        bail!("{NO_INPUT_GUIDANCE}\n{INPUT_EXAMPLE}");
    }
    info!(urls = urls.len(), "collected URLs");

    // Build jobs before touching the filesystem so a bad URL aborts the
    // whole run without side effects
    let jobs = build_jobs(&urls, &settings.save_dir)?;

    tokio::fs::create_dir_all(&settings.save_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create save directory '{}'",
                settings.save_dir.display()
            )
        })?;

    // First Ctrl-C cancels the run gracefully: queued jobs are skipped and
    // in-flight transfers are aborted
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling remaining downloads");
            signal_cancel.cancel();
        }
    });

    let client = HttpClient::with_options(settings.request_timeout, &settings.user_agent);
    let retry_policy = RetryPolicy::new(settings.max_retries, settings.retry_delay);
    let engine = DownloadEngine::new(settings.max_workers, retry_policy)
        .context("invalid download engine configuration")?;

    let report = engine.process_jobs_cancellable(jobs, &client, &cancel).await?;

    let stats = &report.stats;
    info!(
        succeeded = stats.completed(),
        failed = stats.failed(),
        cancelled = stats.cancelled(),
        retried = stats.retried(),
        total = stats.total(),
        save_dir = %settings.save_dir.display(),
        "download summary"
    );

    let failure_lines = render_failure_summary(&report);
    if !failure_lines.is_empty() {
        println!("Failed downloads:");
        for line in &failure_lines {
            println!("{line}");
        }
    }

    Ok(determine_exit_outcome(stats.failed(), stats.cancelled()))
}

/// Loads the config layer (explicit `--config` path or the default
/// location) and folds it with the CLI overrides into final settings.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let file_config = if let Some(path) = &args.config {
        Some(config::load_file_config(path)?)
    } else {
        let loaded = config::load_default_file_config()?;
        if loaded.loaded_from_file
            && let Some(path) = &loaded.path
        {
            debug!(path = %path.display(), "loaded config file");
        }
        loaded.config
    };

    Ok(config::resolve_settings(
        file_config.as_ref(),
        &args.overrides(),
    ))
}

/// Assembles the URL list for this run. Stdin is read only when no URLs
/// were passed as arguments, no `--input` file was given, and stdin is
/// piped rather than a terminal.
fn acquire_urls(args: &Args) -> Result<Vec<String>> {
    let stdin_text = if args.urls.is_empty() && args.input.is_none() && !io::stdin().is_terminal()
    {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read URLs from stdin")?;
        Some(buffer)
    } else {
        None
    };

    input::collect_urls(&args.urls, args.input.as_deref(), stdin_text.as_deref())
}

/// Builds the end-of-run failure summary, one line per failed job with
/// the error from its final attempt.
fn render_failure_summary(report: &BatchReport) -> Vec<String> {
    report
        .outcomes
        .iter()
        .filter_map(|(job, outcome)| match outcome {
            JobOutcome::FailedAfterRetries { attempts, error } => Some(format!(
                "- {} ({attempts} attempts): {error}",
                job.source_url
            )),
            JobOutcome::Succeeded { .. } | JobOutcome::Cancelled => None,
        })
        .collect()
}
