use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

/// `rotation` config value; anything unrecognised never rotates.
fn rotation(value: &str) -> Rotation {
    match value {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// Default directives when `RUST_LOG` is unset. sqlx logs every statement
/// at info, so it is held at warn.
fn default_directives(log_level: &str) -> String {
    format!("{},sqlx=warn", log_level)
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let file_appender = RollingFileAppender::builder()
        .rotation(rotation(&config.rotation))
        .filename_prefix(&config.log_file)
        .build(&config.log_dir)
        .with_context(|| format!("Failed to open log directory {}", config.log_dir))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry
            .with(file_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false);
        registry
            .with(file_layer)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    Ok(guard)
}

/// Best-effort subscriber for tests: writes through the libtest capture and
/// ignores the error when another test already installed one.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives("atomic_ledger=debug")));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_values() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("daily"), Rotation::DAILY);
        assert_eq!(rotation("never"), Rotation::NEVER);
        assert_eq!(rotation("weekly"), Rotation::NEVER);
    }

    #[test]
    fn test_default_directives_quiet_sqlx() {
        assert_eq!(default_directives("info"), "info,sqlx=warn");
        EnvFilter::try_new(default_directives("debug")).unwrap();
    }
}
