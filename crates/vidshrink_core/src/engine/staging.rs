//! The engine's private staging filesystem.
//!
//! Each engine instance owns one directory under the work root. Files are
//! addressed by plain name only; the directory is removed when the engine
//! is dropped.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::error::{EngineError, EngineResult};

#[derive(Debug)]
pub struct StagingFs {
    dir: TempDir,
}

impl StagingFs {
    /// Create a fresh staging directory inside `work_root`.
    pub fn create_in(work_root: &Path) -> EngineResult<Self> {
        std::fs::create_dir_all(work_root).map_err(|e| EngineError::CreateDir {
            path: work_root.to_path_buf(),
            source: e,
        })?;

        let dir = tempfile::Builder::new()
            .prefix("engine-")
            .tempdir_in(work_root)
            .map_err(|e| EngineError::CreateDir {
                path: work_root.to_path_buf(),
                source: e,
            })?;

        tracing::debug!("Engine staging directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Directory the engine runs in.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn resolve(&self, name: &str) -> EngineResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.path().join(name))
    }

    pub async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| EngineError::io(format!("writing {}", name), e))
    }

    /// Copy a file from outside into the staging area. Returns bytes copied.
    pub async fn copy_in(&self, name: &str, source: &Path) -> EngineResult<u64> {
        let path = self.resolve(name)?;
        tokio::fs::copy(source, &path)
            .await
            .map_err(|e| EngineError::io(format!("staging {} as {}", source.display(), name), e))
    }

    pub async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(EngineError::MissingFile(name.to_string()))
            }
            Err(e) => Err(EngineError::io(format!("reading {}", name), e)),
        }
    }

    /// Remove a staged file. Returns false if it did not exist.
    pub async fn remove_file(&self, name: &str) -> EngineResult<bool> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(EngineError::io(format!("removing {}", name), e)),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// Staging names are single path components.
pub fn validate_name(name: &str) -> EngineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        Err(EngineError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
