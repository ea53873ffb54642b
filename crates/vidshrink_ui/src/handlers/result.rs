//! Result handlers: transcode completion, preview and saving.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};

use iced::Task;

use vidshrink_core::config::ConfigSection;
use vidshrink_core::transcode::{save_artifact, TranscodeReport};

use crate::app::{App, Message};

impl App {
    pub fn handle_transcode_finished(&mut self, report: TranscodeReport) {
        if self.session.finish_transcode(report) {
            if let Some(failure) = self.session.state().failure() {
                tracing::warn!("{}", failure);
            }
        }
    }

    /// Open the current artifact in the platform's default player.
    pub fn preview(&mut self) {
        let Some(artifact) = self.session.artifact() else {
            return;
        };
        tracing::info!(
            "Previewing {}",
            artifact.object_url().unwrap_or_else(|| artifact.path.display().to_string())
        );
        if let Err(e) = open_with_default_app(&artifact.path) {
            tracing::warn!("Failed to open preview: {}", e);
            self.notice = Some(Err(format!("Could not open preview: {}", e)));
        }
    }

    /// Ask where to save the current artifact.
    pub fn choose_save_target(&self) -> Task<Message> {
        let Some(artifact) = self.session.artifact() else {
            return Task::none();
        };
        let file_name = artifact.download_name();
        let directory = PathBuf::from(&self.settings().paths.output_folder);

        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_title("Download Converted Video")
                    .set_directory(directory)
                    .set_file_name(file_name)
                    .add_filter("MP4 Video", &["mp4"])
                    .save_file()
                    .await
                    .map(|f| f.path().to_path_buf())
            },
            Message::SaveTargetChosen,
        )
    }

    pub fn save_to(&mut self, destination: Option<PathBuf>) -> Task<Message> {
        let (Some(destination), Some(artifact)) = (destination, self.session.artifact()) else {
            return Task::none();
        };
        let artifact = artifact.clone();

        Task::perform(
            async move {
                save_artifact(&artifact, &destination)
                    .await
                    .map(|_| destination)
                    .map_err(|e| e.to_string())
            },
            Message::Saved,
        )
    }

    pub fn handle_saved(&mut self, result: Result<PathBuf, String>) {
        match result {
            Ok(path) => {
                tracing::info!("Saved {}", path.display());
                self.notice = Some(Ok(format!("Saved to {}", path.display())));
                if let Some(folder) = path.parent() {
                    self.remember_output_folder(folder);
                }
            }
            Err(e) => {
                tracing::error!("Save failed: {}", e);
                self.notice = Some(Err(format!("Save failed: {}", e)));
            }
        }
    }

    /// Persist the folder of the last save as the next default.
    fn remember_output_folder(&mut self, folder: &Path) {
        let folder = folder.to_string_lossy().to_string();
        let Ok(mut cfg) = self.config.lock() else {
            return;
        };
        if cfg.settings().paths.output_folder == folder {
            return;
        }
        cfg.settings_mut().paths.output_folder = folder;
        if let Err(e) = cfg.update_section(ConfigSection::Paths) {
            tracing::warn!("Failed to save output folder: {}", e);
        }
    }
}

fn open_with_default_app(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = Command::new("xdg-open");

    command.arg(path);
    spawn_reaped(command).map(|_| ())
}

/// Spawn `command` and wait for it on a background thread so the exited
/// launcher does not linger as a zombie.
fn spawn_reaped(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn launcher_is_waited_for() {
        let status = spawn_reaped(Command::new("true"))
            .unwrap()
            .join()
            .unwrap()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn missing_launcher_is_an_error() {
        assert!(spawn_reaped(Command::new("/nonexistent/launcher")).is_err());
    }
}
