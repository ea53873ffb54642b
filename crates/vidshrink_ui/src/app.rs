//! Main application module for vidshrink.
//!
//! Holds the session and the status line, and routes messages to the
//! handler modules.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iced::{time, window, Element, Subscription, Task};

use vidshrink_core::config::{ConfigManager, Settings};
use vidshrink_core::engine::EngineHandle;
use vidshrink_core::logging::StatusLine;
use vidshrink_core::session::Session;
use vidshrink_core::transcode::{ArtifactStore, TranscodeReport};

use crate::pages;

/// How often the status line is re-read while the engine is busy.
const STATUS_REFRESH: Duration = Duration::from_millis(100);

/// All messages the application can receive.
#[derive(Debug, Clone)]
pub enum Message {
    // Engine
    LoadEngine,
    EngineLoaded(Result<Arc<EngineHandle>, String>),

    // Selection and transcoding
    PickFile,
    FileSelected(Option<PathBuf>),
    TranscodeFinished(TranscodeReport),

    // Result
    Preview,
    Download,
    SaveTargetChosen(Option<PathBuf>),
    Saved(Result<PathBuf, String>),

    // Window
    Tick,
    CloseRequested(window::Id),
}

pub struct App {
    pub config: Arc<Mutex<ConfigManager>>,
    pub session: Session,
    pub status: StatusLine,
    /// Outcome of the last save or preview, shown under the result.
    pub notice: Option<Result<String, String>>,
}

impl App {
    pub fn new(config: Arc<Mutex<ConfigManager>>, store: Arc<ArtifactStore>) -> Self {
        Self {
            config,
            session: Session::new(store),
            status: StatusLine::new(),
            notice: None,
        }
    }

    pub fn title(&self) -> String {
        match self.session.selected().and_then(|f| f.name()) {
            Some(name) => format!("vidshrink - {}", name),
            None => "vidshrink".to_string(),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        match self.config.lock() {
            Ok(cfg) => cfg.settings().clone(),
            Err(poisoned) => poisoned.into_inner().settings().clone(),
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::LoadEngine => self.load_engine(),
            Message::EngineLoaded(result) => {
                self.handle_engine_loaded(result);
                Task::none()
            }

            Message::PickFile => self.pick_file(),
            Message::FileSelected(path) => self.handle_file_selected(path),
            Message::TranscodeFinished(report) => {
                self.handle_transcode_finished(report);
                Task::none()
            }

            Message::Preview => {
                self.preview();
                Task::none()
            }
            Message::Download => self.choose_save_target(),
            Message::SaveTargetChosen(path) => self.save_to(path),
            Message::Saved(result) => {
                self.handle_saved(result);
                Task::none()
            }

            Message::Tick => Task::none(),
            Message::CloseRequested(id) => self.handle_close_requested(id),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        pages::main_window::view(self)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let close = window::close_requests().map(Message::CloseRequested);

        let state = self.session.state();
        if state.is_loading() || state.is_processing() {
            Subscription::batch([close, time::every(STATUS_REFRESH).map(|_| Message::Tick)])
        } else {
            close
        }
    }
}
