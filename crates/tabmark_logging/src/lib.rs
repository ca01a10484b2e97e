//! Shared logging utilities for Tabmark binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "tabmark=info,tabmark_core=info";
const MAX_LOG_FILES: usize = 5;
const HOME_ENV: &str = "TABMARK_HOME";

/// Logging configuration shared by Tabmark binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
}

/// Initialize tracing with a daily rolling file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_writer = rolling_writer(&log_dir, config.app_name)
        .with_context(|| format!("Failed to open log file for {}", config.app_name))?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Get the Tabmark home directory: ~/.tabmark
///
/// Priority:
/// 1) TABMARK_HOME
/// 2) the user's home directory
/// 3) ./.tabmark
pub fn tabmark_home() -> PathBuf {
    resolve_home(std::env::var(HOME_ENV).ok(), dirs::home_dir())
}

fn resolve_home(override_path: Option<String>, user_home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    user_home
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tabmark")
}

/// Get the logs directory: ~/.tabmark/logs
pub fn logs_dir() -> PathBuf {
    tabmark_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn rolling_writer(dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(sanitize_name(app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(anyhow::Error::from)
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "tabmark".to_string()
    } else {
        cleaned
    }
}
