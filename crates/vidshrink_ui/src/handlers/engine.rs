//! Engine load handlers.

use std::sync::Arc;

use iced::Task;

use vidshrink_core::engine::{self, EngineHandle};
use vidshrink_core::logging::LoadProgress;

use crate::app::{App, Message};

impl App {
    /// Start fetching and initialising the engine.
    pub fn load_engine(&mut self) -> Task<Message> {
        if let Err(e) = self.session.begin_load() {
            tracing::warn!("{}", e);
            return Task::none();
        }

        let settings = self.settings();
        let on_log = self.status.callback();
        let progress = self.status.clone();
        progress.publish(&LoadProgress::Downloading { percent: 0 }.describe());

        Task::perform(
            async move {
                engine::load(&settings, on_log, move |p: LoadProgress| {
                    progress.publish(&p.describe())
                })
                .await
                .map(Arc::new)
                .map_err(|e| e.to_string())
            },
            Message::EngineLoaded,
        )
    }

    pub fn handle_engine_loaded(&mut self, result: Result<Arc<EngineHandle>, String>) {
        match result {
            Ok(engine) => {
                self.session.engine_loaded(engine);
            }
            Err(reason) => {
                self.session.engine_failed(reason);
                self.status.clear();
            }
        }
    }
}
