//! Application logging functionality
//!
//! Sets up the `tracing` subscriber and manages the log file directory

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "bezy-project.log";

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    crate::core::config_file::ConfigFile::config_dir().join("logs")
}

/// Get the path to today's log file
pub fn current_log_file() -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    logs_dir().join(format!("{LOG_FILE_PREFIX}.{timestamp}"))
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    fs::create_dir_all(logs_dir())?;
    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `level`. With `to_file`, logs are also
/// written to a daily rolling file; keep the returned guard alive until
/// exit so buffered lines get flushed.
pub fn init_tracing(level: &str, to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    if !to_file {
        registry.try_init()?;
        return Ok(None);
    }

    initialize_logs_directory()?;
    let appender = tracing_appender::rolling::daily(logs_dir(), LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;
    tracing::debug!("Logging to {:?}", current_log_file());
    Ok(Some(guard))
}
