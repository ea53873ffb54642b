//! Published transcode results.
//!
//! Each result lives as a file in the artifact store and is addressed by a
//! `file://` URL. Revoking an artifact deletes its file; the whole store is
//! removed when it is dropped.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use uuid::Uuid;

use super::command::OUTPUT_MIME;
use super::filename::download_file_name;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Artifact has been revoked: {0}")]
    Revoked(PathBuf),
}

impl PublishError {
    fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// One compressed video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub id: Uuid,
    /// Request sequence number that produced this artifact.
    pub seq: u64,
    pub path: PathBuf,
    pub mime: &'static str,
    pub len: u64,
    /// File name of the source video, when known.
    pub source_name: Option<String>,
}

impl OutputArtifact {
    /// `file://` URL of the artifact, usable as a link or media source.
    pub fn object_url(&self) -> Option<String> {
        reqwest::Url::from_file_path(&self.path)
            .ok()
            .map(|url| url.to_string())
    }

    /// Suggested name when the user saves this artifact.
    pub fn download_name(&self) -> String {
        download_file_name(self.source_name.as_deref())
    }

    /// False once the artifact has been revoked.
    pub fn is_live(&self) -> bool {
        self.path.is_file()
    }
}

/// Directory owning every artifact of one session.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: TempDir,
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a fresh store inside `work_root`.
    pub fn create_in(work_root: &Path) -> Result<Self, PublishError> {
        std::fs::create_dir_all(work_root)
            .map_err(|e| PublishError::io(format!("creating {}", work_root.display()), e))?;

        let dir = tempfile::Builder::new()
            .prefix("artifacts-")
            .tempdir_in(work_root)
            .map_err(|e| PublishError::io("creating artifact store", e))?;
        // Object URLs need an absolute path.
        let root = dir
            .path()
            .canonicalize()
            .map_err(|e| PublishError::io("resolving artifact store", e))?;

        tracing::debug!("Artifact store: {}", root.display());
        Ok(Self { dir, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` as a new artifact for request `seq`.
    pub async fn store(
        &self,
        seq: u64,
        source_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<OutputArtifact, PublishError> {
        let id = Uuid::new_v4();
        let path = self.root.join(format!("{}-{}.mp4", seq, id));

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PublishError::io(format!("writing {}", path.display()), e))?;

        Ok(OutputArtifact {
            id,
            seq,
            path,
            mime: OUTPUT_MIME,
            len: bytes.len() as u64,
            source_name: source_name.map(str::to_string),
        })
    }

    /// Release an artifact. Returns false if it was already gone.
    pub fn revoke(&self, artifact: &OutputArtifact) -> bool {
        if !artifact.path.starts_with(&self.root) {
            tracing::warn!(
                "Refusing to revoke artifact outside the store: {}",
                artifact.path.display()
            );
            return false;
        }

        match std::fs::remove_file(&artifact.path) {
            Ok(()) => {
                tracing::debug!("Revoked artifact #{} ({})", artifact.seq, artifact.id);
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!("Failed to revoke {}: {}", artifact.path.display(), e);
                false
            }
        }
    }

    /// Number of artifacts currently held.
    pub fn live_count(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}

/// Copy an artifact to a user-chosen destination. Returns bytes written.
pub async fn save_artifact(
    artifact: &OutputArtifact,
    destination: &Path,
) -> Result<u64, PublishError> {
    if !artifact.is_live() {
        return Err(PublishError::Revoked(artifact.path.clone()));
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PublishError::io(format!("creating {}", parent.display()), e))?;
        }
    }

    let written = tokio::fs::copy(&artifact.path, destination)
        .await
        .map_err(|e| PublishError::io(format!("saving to {}", destination.display()), e))?;

    tracing::info!("Saved {} ({} bytes)", destination.display(), written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stored_artifact_is_mp4_with_file_url() {
        let work = tempdir().unwrap();
        let store = ArtifactStore::create_in(work.path()).unwrap();

        let artifact = store.store(3, Some("my video.mov"), b"data").await.unwrap();

        assert_eq!(artifact.mime, "video/mp4");
        assert_eq!(artifact.len, 4);
        assert_eq!(artifact.seq, 3);
        assert!(artifact.is_live());
        assert!(artifact.object_url().unwrap().starts_with("file://"));
        assert_eq!(artifact.download_name(), "my_video_compressed.mp4");
    }

    #[tokio::test]
    async fn revoke_removes_file_once() {
        let work = tempdir().unwrap();
        let store = ArtifactStore::create_in(work.path()).unwrap();
        let artifact = store.store(1, None, b"data").await.unwrap();
        assert_eq!(store.live_count(), 1);

        assert!(store.revoke(&artifact));
        assert!(!artifact.is_live());
        assert!(!store.revoke(&artifact));
        assert_eq!(store.live_count(), 0);
        assert_eq!(artifact.download_name(), "output_compressed.mp4");
    }

    #[tokio::test]
    async fn save_copies_live_artifact_and_rejects_revoked() {
        let work = tempdir().unwrap();
        let store = ArtifactStore::create_in(&work.path().join("work")).unwrap();
        let artifact = store.store(1, Some("clip.MP4"), b"compressed").await.unwrap();

        let dest = work.path().join("out").join(artifact.download_name());
        let written = save_artifact(&artifact, &dest).await.unwrap();
        assert_eq!(written, 10);
        assert_eq!(std::fs::read(&dest).unwrap(), b"compressed");

        store.revoke(&artifact);
        let err = save_artifact(&artifact, &dest).await.unwrap_err();
        assert!(matches!(err, PublishError::Revoked(_)));
    }

    #[test]
    fn store_removed_on_drop() {
        let work = tempdir().unwrap();
        let store = ArtifactStore::create_in(work.path()).unwrap();
        let root = store.root().to_path_buf();
        drop(store);
        assert!(!root.exists());
    }
}
