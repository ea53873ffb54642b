//! Logging types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level debugging (very verbose).
    Trace,
    /// Debug information.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

impl LogLevel {
    /// Convert to tracing level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    pub(crate) fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Callback receiving every free-text line the engine emits.
///
/// Registered once at engine load and kept for the lifetime of the handle.
pub type EngineLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Progress updates while the engine is being fetched and initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    /// Using an existing executable, nothing to fetch.
    UsingLocal,
    /// Downloading the engine executable.
    Downloading { percent: u8 },
    /// Checking the executable against its digest.
    Verifying,
    /// Launching the engine once to confirm it runs.
    Initializing,
    Ready,
}

impl LoadProgress {
    /// Short human-readable description for the status line.
    pub fn describe(&self) -> String {
        match self {
            LoadProgress::UsingLocal => "Using local engine".to_string(),
            LoadProgress::Downloading { percent } => format!("Downloading engine: {}%", percent),
            LoadProgress::Verifying => "Verifying engine".to_string(),
            LoadProgress::Initializing => "Starting engine".to_string(),
            LoadProgress::Ready => "Engine ready".to_string(),
        }
    }
}
