//! Tracing subscriber setup.
//!
//! Stdout gets json or pretty output per config; when a log directory is
//! configured a daily-rotated json file layer is added. The returned guard
//! must be held for the life of the process so buffered file output
//! flushes.

use anyhow::Result;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::config::LoggingConfig;

/// Initialized logging, holding the file writer guard alive.
pub struct Logging {
    _guard: Option<WorkerGuard>,
}

impl Logging {
    /// Install the global tracing subscriber from config.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::daily(log_dir, "arbiter.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File output stays json regardless of the stdout format.
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true);

            let registry = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer);
            if config.format == "json" {
                registry
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            } else {
                registry
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .init();
            }
            Some(guard)
        } else {
            let registry = tracing_subscriber::registry().with(env_filter);
            if config.format == "json" {
                registry
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            } else {
                registry
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .init();
            }
            None
        };

        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => anyhow::bail!("Invalid log level: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_accepts_known_levels() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_parse_log_level_rejects_unknown() {
        assert!(parse_log_level("verbose").is_err());
    }
}
