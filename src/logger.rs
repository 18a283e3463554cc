//! Debug logging support for callfix
//!
//! When debug mode is enabled (config `[logging] debug = true` or `--debug`),
//! match decisions and file writes are logged to ~/.callfix/callfix.log

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Initialize the debug logging system
///
/// Returns the path to the log file, or None if logging is not enabled.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    init_debug_logging_at(&get_log_path()?)
}

fn init_debug_logging_at(log_path: &Path) -> Result<Option<PathBuf>> {
    match open_log_file(log_path) {
        Ok(log_file) => {
            let subscriber = registry()
                .with(
                    fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false)
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .with(EnvFilter::new("callfix=debug"));

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

            Ok(Some(log_path.to_path_buf()))
        }
        Err(e) => {
            // Logging is optional; patching goes ahead without it
            eprintln!("Warning: Could not create log file: {:#}", e);
            Ok(None)
        }
    }
}

/// Create the log directory if needed and open the log file for appending
fn open_log_file(log_path: &Path) -> Result<fs::File> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))
}

/// Get the log file path (~/.callfix/callfix.log)
pub fn get_log_path() -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join("callfix.log"))
}
