//! Logging init: file under XDG state dir, or stderr when that is unavailable.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,flush=debug,flush_core=debug";
const LOG_FILE: &str = "flush.log";

/// `RUST_LOG` if set and valid, else [`DEFAULT_FILTER`].
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Creates `dir` if needed and opens `dir/flush.log` for appending.
fn open_log_file(dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok((path, file))
}

/// Logs to `~/.local/state/flush/flush.log`.
///
/// Returns Err when the file cannot be opened or a subscriber is already
/// installed; the caller then falls back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let state_home = xdg::BaseDirectories::with_prefix("flush")?.get_state_home();
    let (path, file) = open_log_file(&state_home)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    tracing::info!("flush logging initialized at {}", path.display());
    Ok(path)
}

/// Logs to stderr only.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
