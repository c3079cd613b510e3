/// Client logging configuration.
///
/// Every command appends to one file under `{data_root}/logs/`, starting
/// with a separator so runs are easy to tell apart. Nothing is logged to
/// the terminal; user-facing output goes through stdout/stderr directly.
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "intelink.log";

pub fn log_file_path(data_root: &Path) -> PathBuf {
    data_root.join("logs").join(LOG_FILE_NAME)
}

/// Initializes file logging and returns the log file path.
///
/// # Arguments
///
/// * `data_root` - Path to the client's data directory
/// * `default_filter` - Filter used when RUST_LOG is not set
/// * `command` - Command name written into the run separator
pub fn init_logging(data_root: &Path, default_filter: &str, command: &str) -> Result<PathBuf> {
    let log_path = log_file_path(data_root);
    let log_dir = data_root.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Separator first so it precedes this run's events
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
    writeln!(
        file,
        "\n{sep}\n[{ts}] intelink {command} (v{version})\n{sep}",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        command = command,
        version = env!("CARGO_PKG_VERSION"),
    )
    .with_context(|| format!("Failed to write log file: {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("Invalid log filter '{}'", default_filter))?;

    let file_layer = fmt::layer()
        .with_writer(tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // Already initialized in tests that call this twice
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok();

    tracing::info!("Logging initialized for command: {}", command);
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        assert_eq!(
            log_file_path(Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/logs/intelink.log")
        );
    }
}
