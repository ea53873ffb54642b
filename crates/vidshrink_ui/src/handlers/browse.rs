//! File browsing handlers.

use std::path::PathBuf;

use iced::Task;

use vidshrink_core::session::{SelectedFile, VIDEO_EXTENSIONS};
use vidshrink_core::transcode;

use crate::app::{App, Message};

impl App {
    /// Browse for a video to compress.
    pub fn pick_file(&self) -> Task<Message> {
        Task::perform(
            async {
                rfd::AsyncFileDialog::new()
                    .set_title("Choose video")
                    .add_filter("Video Files", VIDEO_EXTENSIONS)
                    .add_filter("All Files", &["*"])
                    .pick_file()
                    .await
                    .map(|f| f.path().to_path_buf())
            },
            Message::FileSelected,
        )
    }

    /// Handle file selected from browser. A cancelled dialog clears the
    /// selection and the previous result.
    pub fn handle_file_selected(&mut self, path: Option<PathBuf>) -> Task<Message> {
        self.notice = None;
        let file = path.map(SelectedFile::from_path);

        match self.session.select_file(file) {
            Some(ticket) => {
                let store = self.session.store().clone();
                Task::perform(transcode::run(ticket, store), Message::TranscodeFinished)
            }
            None => Task::none(),
        }
    }
}
