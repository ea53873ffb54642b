//! Window management handlers.

use iced::{window, Task};

use crate::app::{App, Message};

impl App {
    /// Release the engine and artifacts before the window goes away.
    pub fn handle_close_requested(&mut self, id: window::Id) -> Task<Message> {
        tracing::info!("Close requested, tearing down session");
        self.session.teardown();
        self.status.clear();
        window::close(id).chain(iced::exit())
    }
}
