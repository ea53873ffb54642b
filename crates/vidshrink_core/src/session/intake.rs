//! The user's file selection.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Extensions offered by the picker's video filter. Advisory only: any
/// file can still be chosen and is handed to the engine as is.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "webm", "avi", "m4v", "ts", "m2ts", "mpg", "mpeg", "wmv", "flv", "3gp",
];

/// A file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub size: Option<u64>,
}

impl SelectedFile {
    /// Reference a file by path. Size is read when available; no other
    /// validation is done here.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let size = std::fs::metadata(&path).ok().map(|m| m.len());
        Self { path, size }
    }

    /// File name as shown to the user, if the path has one. Bytes that are
    /// not valid UTF-8 become U+FFFD.
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.path.file_name().map(|n| n.to_string_lossy())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
