//! Engine asset naming, cache layout and digest checks.
//!
//! The engine is published as one gzip-compressed executable per platform
//! (`ffmpeg-linux-x64.gz`), optionally with a `.sha256` digest of the
//! unpacked executable next to it. The unpacked executable and its digest
//! are cached under the engine cache directory.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::error::{EngineError, EngineResult};

/// Suffix of the digest file published next to each asset.
pub const DIGEST_SUFFIX: &str = ".sha256";

/// Suffix of the compressed executable.
pub const ARCHIVE_SUFFIX: &str = ".gz";

/// Remote locations of the two engine payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAssets {
    pub archive_url: String,
    pub digest_url: String,
}

impl EngineAssets {
    /// Build the asset URLs for the running platform.
    pub fn for_current_platform(base_url: &str) -> EngineResult<Self> {
        Ok(Self::for_asset(base_url, &platform_asset_name()?))
    }

    pub fn for_asset(base_url: &str, asset: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            archive_url: format!("{}/{}{}", base, asset, ARCHIVE_SUFFIX),
            digest_url: format!("{}/{}{}", base, asset, DIGEST_SUFFIX),
        }
    }
}

/// Asset name for the running platform, e.g. `ffmpeg-linux-x64`.
pub fn platform_asset_name() -> EngineResult<String> {
    let os = if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "win32"
    } else {
        return Err(EngineError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ));
    };

    let arch = if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        return Err(EngineError::UnsupportedPlatform(
            std::env::consts::ARCH.to_string(),
        ));
    };

    // Windows assets carry no `.exe`; the cached copy does.
    Ok(format!("ffmpeg-{}-{}", os, arch))
}

/// Paths of the cached engine payloads.
#[derive(Debug, Clone)]
pub struct EnginePaths {
    /// Cache directory (e.g. `.data/engine`).
    pub root: PathBuf,
    /// Cached executable.
    pub executable: PathBuf,
    /// Cached digest of the executable.
    pub digest: PathBuf,
}

impl EnginePaths {
    pub fn new(cache_dir: &Path) -> Self {
        #[cfg(windows)]
        let executable = cache_dir.join("ffmpeg.exe");
        #[cfg(not(windows))]
        let executable = cache_dir.join("ffmpeg");

        Self {
            root: cache_dir.to_path_buf(),
            digest: cache_dir.join(format!("ffmpeg{}", DIGEST_SUFFIX)),
            executable,
        }
    }

    /// Unpacked executable before the digest has been checked.
    pub fn partial(&self) -> PathBuf {
        self.root.join("ffmpeg.part")
    }

    /// Compressed download before it is unpacked.
    pub fn archive_partial(&self) -> PathBuf {
        self.root.join("ffmpeg.gz.part")
    }

    /// True when both payloads are cached and the executable matches.
    pub async fn is_verified(&self) -> bool {
        if !self.executable.exists() || !self.digest.exists() {
            return false;
        }

        let expected = match tokio::fs::read_to_string(&self.digest).await {
            Ok(text) => match parse_digest(&text, &self.digest.display().to_string()) {
                Ok(digest) => digest,
                Err(e) => {
                    tracing::warn!("Ignoring cached engine: {}", e);
                    return false;
                }
            },
            Err(_) => return false,
        };

        match sha256_file(&self.executable).await {
            Ok(actual) => actual == expected,
            Err(e) => {
                tracing::warn!("Failed to hash cached engine: {}", e);
                false
            }
        }
    }
}

/// Extract the hex digest from a `.sha256` file.
///
/// Accepts a bare digest or the `sha256sum` layout (`<digest>  <name>`).
pub fn parse_digest(text: &str, origin: &str) -> EngineResult<String> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| EngineError::MalformedDigest(origin.to_string()))?;

    if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EngineError::MalformedDigest(origin.to_string()));
    }

    Ok(token.to_ascii_lowercase())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub async fn sha256_file(path: &Path) -> EngineResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EngineError::io(format!("reading {}", path.display()), e))?;
    Ok(sha256_hex(&bytes))
}
