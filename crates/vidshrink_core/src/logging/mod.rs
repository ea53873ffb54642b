//! Logging infrastructure for vidshrink.
//!
//! This module provides:
//! - Global `tracing` subscriber setup (stderr, optional rolling file)
//! - The engine status line (latest message only)
//! - A bounded tail of engine output for error reports

mod status_line;
mod types;

use std::path::Path;

pub use status_line::{OutputTail, StatusLine};
pub use types::{EngineLogCallback, LoadProgress, LogLevel};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name prefix inside the logs folder.
const LOG_FILE_PREFIX: &str = "vidshrink.log";

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}

/// Initialize global tracing subscriber writing to stderr.
///
/// Respects RUST_LOG and falls back to the provided default level.
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .init();
}

/// Initialize tracing to stderr plus a daily rolling file in `logs_dir`.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the application.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer),
        )
        .with(env_filter(default_level))
        .init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_strings() {
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Info.as_filter_str(), "info");
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn load_progress_descriptions() {
        assert_eq!(
            LoadProgress::Downloading { percent: 42 }.describe(),
            "Downloading engine: 42%"
        );
        assert_eq!(LoadProgress::Ready.describe(), "Engine ready");
    }
}
