//! Logging initialization for vault-sync.
//!
//! Logs go to stderr unless `logging.to_file` is set, in which case they are
//! written to `<state>/logs/vault-sync-{datetime}.log`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Flushes buffered file output when dropped, so it must outlive `main`'s work
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Level filter: `--debug` beats `RUST_LOG`, which beats the config
pub fn effective_filter(config: &Config, debug_override: bool) -> EnvFilter {
    if debug_override {
        return EnvFilter::new("debug");
    }
    // An unset or unparseable RUST_LOG falls back to the configured level
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
}

/// File name for a log started at `now`
pub fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("vault-sync-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}

/// Non-blocking writer for a fresh timestamped file under `logs_dir`
fn file_writer(logs_dir: &Path) -> Result<(NonBlocking, WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let file_name = log_file_name(chrono::Utc::now());
    let appender = tracing_appender::rolling::never(logs_dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((writer, guard, logs_dir.join(file_name)))
}

/// Install the global subscriber.
///
/// The returned handle must be kept alive for the duration of the program.
pub fn init_logging(config: &Config, debug_override: bool) -> Result<LoggingHandle> {
    let (writer, guard, log_file_path) = if config.logging.to_file {
        let (writer, guard, path) = file_writer(&config.logs_path())?;
        (BoxMakeWriter::new(writer), Some(guard), Some(path))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None, None)
    };

    tracing_subscriber::registry()
        .with(effective_filter(config, debug_override))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(!config.logging.to_file) // no escape codes in files
                .with_writer(writer),
        )
        .try_init()
        .context("Logging was already initialized")?;

    Ok(LoggingHandle {
        _guard: guard,
        log_file_path,
    })
}
