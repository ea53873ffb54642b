//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Pinned release the engine archive is fetched from.
pub const DEFAULT_ENGINE_BASE_URL: &str =
    "https://github.com/eugeneware/ffmpeg-static/releases/download/b6.0";

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Engine download and invocation settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Folders used for the engine cache, staging, saved output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Cache folder for downloaded engine assets.
    #[serde(default = "default_data_folder")]
    pub data_folder: String,

    /// Root for engine staging directories and the artifact store.
    #[serde(default = "default_work_root")]
    pub work_root: String,

    /// Default folder offered when saving a compressed video.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_data_folder() -> String {
    ".data".to_string()
}

fn default_work_root() -> String {
    ".temp".to_string()
}

fn default_output_folder() -> String {
    "compressed".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            work_root: default_work_root(),
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    /// Directory holding the cached engine executable and digest.
    pub fn engine_cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_folder).join("engine")
    }

    pub fn work_root(&self) -> PathBuf {
        PathBuf::from(&self.work_root)
    }
}

/// Engine source and invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Version-pinned location the engine assets are fetched from.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Expected SHA-256 of the unpacked executable. Empty = use the digest
    /// published next to the archive, or record the first download's.
    #[serde(default)]
    pub sha256: String,

    /// Use this executable instead of downloading one. Empty = download.
    #[serde(default)]
    pub binary_path: String,

    /// Skip the download when a cached executable matches its cached digest.
    #[serde(default = "default_true")]
    pub reuse_cache: bool,

    /// Upper bound for one engine invocation in seconds. 0 = no limit.
    #[serde(default)]
    pub exec_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_ENGINE_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sha256: String::new(),
            binary_path: String::new(),
            reuse_cache: true,
            exec_timeout_secs: 0,
        }
    }
}

impl EngineSettings {
    /// Explicit executable override, if configured.
    pub fn binary_override(&self) -> Option<PathBuf> {
        let trimmed = self.binary_path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }

    /// Configured digest pin, if any.
    pub fn pinned_sha256(&self) -> Option<&str> {
        let trimmed = self.sha256.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn exec_timeout(&self) -> Option<Duration> {
        (self.exec_timeout_secs > 0).then(|| Duration::from_secs(self.exec_timeout_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a daily rolling log file into the logs folder.
    #[serde(default = "default_true")]
    pub log_to_file: bool,

    /// Number of engine output lines kept for error reports.
    #[serde(default = "default_status_tail")]
    pub status_tail: usize,
}

fn default_status_tail() -> usize {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            log_to_file: true,
            status_tail: default_status_tail(),
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Engine,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Engine => "engine",
            ConfigSection::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("base_url"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\noutput_folder = \"custom_output\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.paths.output_folder, "custom_output");
        assert_eq!(parsed.paths.work_root, ".temp");
        assert!(parsed.engine.reuse_cache);
        assert_eq!(parsed.engine.base_url, DEFAULT_ENGINE_BASE_URL);
        assert_eq!(parsed.logging.status_tail, 20);
    }

    #[test]
    fn blank_binary_path_means_download() {
        let mut engine = EngineSettings::default();
        assert!(engine.binary_override().is_none());

        engine.binary_path = "  ".to_string();
        assert!(engine.binary_override().is_none());

        engine.binary_path = "/usr/bin/ffmpeg".to_string();
        assert_eq!(engine.binary_override(), Some(PathBuf::from("/usr/bin/ffmpeg")));
    }

    #[test]
    fn zero_timeout_is_unbounded() {
        let mut engine = EngineSettings::default();
        assert_eq!(engine.exec_timeout(), None);

        engine.exec_timeout_secs = 90;
        assert_eq!(engine.exec_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn log_level_parses_lowercase() {
        let parsed: Settings = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(parsed.logging.level, LogLevel::Debug);
    }
}
