//! Logging setup with file rotation.

use crate::config::LoggingSettings;

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "knowledge-studio";
const LOG_FILE_SUFFIX: &str = "log";

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: human-readable, colored
/// - File: plain text, daily rotation, `retention_days` files kept
///
/// `RUST_LOG` overrides the configured level.
pub fn setup_logging(
    config_dir: &Path,
    settings: &LoggingSettings,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let logs_dir = config_dir.join(&settings.directory);
    std::fs::create_dir_all(&logs_dir)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(settings.retention_days)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&logs_dir)?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(logs_dir)
}

/// Path to today's log file (for diagnostics).
pub fn current_log_path(logs_dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    logs_dir.join(format!("{LOG_FILE_PREFIX}.{today}.{LOG_FILE_SUFFIX}"))
}
