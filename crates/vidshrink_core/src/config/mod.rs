//! Configuration management for vidshrink.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults for missing keys, written back on load
//!
//! # Example
//!
//! ```no_run
//! use vidshrink_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Engine source: {}", config.settings().engine.base_url);
//!
//! config.settings_mut().engine.exec_timeout_secs = 900;
//! config.update_section(ConfigSection::Engine).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, PathSettings, Settings,
    DEFAULT_ENGINE_BASE_URL,
};
