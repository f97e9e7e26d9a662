//! Tracing setup.
//!
//! Logs go to a daily-rotated file under `$JTUTOR_HOME/logs/` so stdout stays
//! free for rendered lessons. `JTUTOR_LOG` takes an `EnvFilter` directive
//! (default `info`).

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "JTUTOR_LOG";

const LOG_FILE_PREFIX: &str = "jtutor.log";

/// Builds the filter from `JTUTOR_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber writing to `logs_dir`.
///
/// The returned guard flushes buffered lines on drop; hold it for the life of
/// the process.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to install tracing subscriber: {err}"))?;

    tracing::debug!(dir = %logs_dir.display(), "logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_init_creates_log_directory() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        // A second install in the same test binary fails; the directory is
        // created either way.
        let _guard = init(&logs);
        assert!(logs.is_dir());
    }
}
