//! Application configuration loading for batch run defaults.
//!
//! Defaults come from constants, a config file can override them, and CLI
//! flags override both. [`resolve_settings`] folds the three layers into the
//! [`Settings`] the rest of the program runs with.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::download::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SAVE_DIR};
use crate::download::{DEFAULT_MAX_RETRIES, DEFAULT_MAX_WORKERS, DEFAULT_RETRY_DELAY};
use crate::user_agent;

/// TOML-backed file configuration for batchfetch defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default directory downloaded files are written into.
    pub save_dir: Option<PathBuf>,
    /// Default worker count (same range as CLI).
    pub max_workers: Option<u8>,
    /// Default attempts per download, including the first (same range as CLI).
    pub max_retries: Option<u8>,
    /// Default delay between attempts in seconds.
    pub retry_delay_secs: Option<u64>,
    /// Default whole-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// User-Agent header sent with every request.
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_workers) = self.max_workers
            && !(1..=64).contains(&max_workers)
        {
            bail!("Invalid config value for `max_workers`: {max_workers}. Expected range: 1..=64");
        }

        if let Some(max_retries) = self.max_retries
            && !(1..=10).contains(&max_retries)
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 1..=10");
        }

        if let Some(retry_delay_secs) = self.retry_delay_secs
            && retry_delay_secs > 300
        {
            bail!(
                "Invalid config value for `retry_delay_secs`: {retry_delay_secs}. Expected range: 0..=300"
            );
        }

        if let Some(request_timeout_secs) = self.request_timeout_secs
            && !(1..=3600).contains(&request_timeout_secs)
        {
            bail!(
                "Invalid config value for `request_timeout_secs`: {request_timeout_secs}. Expected range: 1..=3600"
            );
        }

        if let Some(user_agent) = &self.user_agent
            && user_agent.trim().is_empty()
        {
            bail!("Invalid config value for `user_agent`: must not be empty");
        }

        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory downloaded files are written into.
    pub save_dir: PathBuf,
    /// Maximum concurrent downloads.
    pub max_workers: usize,
    /// Attempts per download, including the first.
    pub max_retries: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Whole-request timeout per attempt.
    pub request_timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            max_workers: DEFAULT_MAX_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// Per-field overrides supplied on the command line.
///
/// Fields left as `None` defer to the config file, which in turn defers to
/// the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Overrides the save directory.
    pub save_dir: Option<PathBuf>,
    /// Overrides the worker count.
    pub max_workers: Option<u8>,
    /// Overrides the attempt budget.
    pub max_retries: Option<u8>,
    /// Overrides the retry delay in seconds.
    pub retry_delay_secs: Option<u64>,
    /// Overrides the request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Overrides the User-Agent header.
    pub user_agent: Option<String>,
}

/// Folds defaults, file config, and CLI overrides into final settings.
///
/// Precedence, lowest to highest: built-in defaults, config file, CLI.
#[must_use]
pub fn resolve_settings(file: Option<&FileConfig>, overrides: &SettingsOverrides) -> Settings {
    let mut settings = Settings::default();

    if let Some(file) = file {
        if let Some(save_dir) = &file.save_dir {
            settings.save_dir = save_dir.clone();
        }
        if let Some(max_workers) = file.max_workers {
            settings.max_workers = usize::from(max_workers);
        }
        if let Some(max_retries) = file.max_retries {
            settings.max_retries = u32::from(max_retries);
        }
        if let Some(retry_delay_secs) = file.retry_delay_secs {
            settings.retry_delay = Duration::from_secs(retry_delay_secs);
        }
        if let Some(request_timeout_secs) = file.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(request_timeout_secs);
        }
        if let Some(user_agent) = &file.user_agent {
            settings.user_agent = user_agent.clone();
        }
    }

    if let Some(save_dir) = &overrides.save_dir {
        settings.save_dir = save_dir.clone();
    }
    if let Some(max_workers) = overrides.max_workers {
        settings.max_workers = usize::from(max_workers);
    }
    if let Some(max_retries) = overrides.max_retries {
        settings.max_retries = u32::from(max_retries);
    }
    if let Some(retry_delay_secs) = overrides.retry_delay_secs {
        settings.retry_delay = Duration::from_secs(retry_delay_secs);
    }
    if let Some(request_timeout_secs) = overrides.request_timeout_secs {
        settings.request_timeout = Duration::from_secs(request_timeout_secs);
    }
    if let Some(user_agent) = &overrides.user_agent {
        settings.user_agent = user_agent.clone();
    }

    settings
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/batchfetch/config.toml`
/// 2. `$HOME/.config/batchfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("batchfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("batchfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Loads config from an explicit path (the `--config` flag).
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "save_dir" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `save_dir` value on line {}", line_index + 1)
                })?;
                cfg.save_dir = Some(PathBuf::from(parsed));
            }
            "max_workers" => {
                let parsed = parse_integer_u8(value).with_context(|| {
                    format!("Invalid `max_workers` value on line {}", line_index + 1)
                })?;
                cfg.max_workers = Some(parsed);
            }
            "max_retries" => {
                let parsed = parse_integer_u8(value).with_context(|| {
                    format!("Invalid `max_retries` value on line {}", line_index + 1)
                })?;
                cfg.max_retries = Some(parsed);
            }
            "retry_delay_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `retry_delay_secs` value on line {}", line_index + 1)
                })?;
                cfg.retry_delay_secs = Some(parsed);
            }
            "request_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!(
                        "Invalid `request_timeout_secs` value on line {}",
                        line_index + 1
                    )
                })?;
                cfg.request_timeout_secs = Some(parsed);
            }
            "user_agent" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `user_agent` value on line {}", line_index + 1)
                })?;
                cfg.user_agent = Some(parsed);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
