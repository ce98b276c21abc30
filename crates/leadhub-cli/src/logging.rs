//! Tracing setup: daily log files, optionally mirrored to stderr.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_FILE_PREFIX: &str = "leadhub.log";

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines reach the file.
pub fn init(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter());
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(guard)
}

/// `RUST_LOG` when set, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_is_in_log_file_after_guard_drops() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init(dir.path(), false).unwrap();

        crate::exit_code(Err(anyhow::anyhow!("Backend unreachable")));
        drop(guard);

        let mut contents = String::new();
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            contents.push_str(&std::fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        assert!(contents.contains("[Main] Command failed: Backend unreachable"));
    }
}
