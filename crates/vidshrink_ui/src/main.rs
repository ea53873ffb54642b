//! vidshrink - Main entry point
//!
//! Handles configuration loading, directory creation, logging setup and
//! the iced application launch.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use directories::ProjectDirs;
use iced::{window, Size};

use vidshrink_core::config::ConfigManager;
use vidshrink_core::logging::{init_tracing, init_tracing_with_file};
use vidshrink_core::transcode::ArtifactStore;

mod app;
mod handlers;
mod pages;
mod theme;

use app::App;

/// Config path in the platform config directory, falling back to
/// `.config/settings.toml` under the working directory.
fn default_config_path() -> PathBuf {
    ProjectDirs::from("io.github", "vidshrink", "vidshrink")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".config").join("settings.toml"))
}

fn main() -> anyhow::Result<()> {
    let config_path = default_config_path();
    let mut config_manager = ConfigManager::new(&config_path);

    if let Err(e) = config_manager.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let logging = config_manager.settings().logging.clone();
    let _log_guard = if logging.log_to_file {
        Some(init_tracing_with_file(
            logging.level,
            &config_manager.logs_folder(),
        ))
    } else {
        init_tracing(logging.level);
        None
    };

    tracing::info!("vidshrink starting");
    tracing::info!("Config: {}", config_path.display());
    tracing::info!("Core version: {}", vidshrink_core::version());

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
        eprintln!("Warning: Failed to create directories: {}", e);
    }

    let store = ArtifactStore::create_in(&config_manager.settings().paths.work_root())
        .context("failed to create artifact store")?;
    let store = Arc::new(store);
    let config = Arc::new(Mutex::new(config_manager));

    tracing::info!("Application initialized, starting iced event loop");

    iced::application(
        move || App::new(config.clone(), store.clone()),
        App::update,
        App::view,
    )
    .title(App::title)
    .subscription(App::subscription)
    .window(window::Settings {
        size: Size::new(560.0, 360.0),
        exit_on_close_request: false,
        ..Default::default()
    })
    .run()
    .context("UI event loop failed")?;

    tracing::info!("vidshrink exiting");
    Ok(())
}
