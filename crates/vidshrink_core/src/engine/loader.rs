//! Engine loader.
//!
//! Fetches the pinned engine archive and its digest, unpacks, verifies and
//! caches the executable, then initialises an [`EngineHandle`] from the
//! local copy.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use futures_util::StreamExt;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use super::assets::{parse_digest, EngineAssets, EnginePaths};
use super::error::{EngineError, EngineResult};
use super::handle::{EngineHandle, EngineOptions};
use crate::config::{EngineSettings, Settings};
use crate::logging::{EngineLogCallback, LoadProgress};

/// Load the engine described by `settings`.
///
/// `on_log` receives every line the engine emits for the lifetime of the
/// returned handle. Nothing is retried: any failure is returned as is.
pub async fn load(
    settings: &Settings,
    on_log: EngineLogCallback,
    on_progress: impl Fn(LoadProgress),
) -> EngineResult<EngineHandle> {
    let executable = match settings.engine.binary_override() {
        Some(path) => {
            tracing::info!("Using configured engine {}", path.display());
            on_progress(LoadProgress::UsingLocal);
            path
        }
        None => {
            ensure_engine(
                &settings.paths.engine_cache_dir(),
                &settings.engine,
                &on_progress,
            )
            .await?
        }
    };

    on_progress(LoadProgress::Initializing);
    let options = EngineOptions {
        exec_timeout: settings.engine.exec_timeout(),
        tail_lines: settings.logging.status_tail,
    };
    let handle =
        EngineHandle::initialize(executable, &settings.paths.work_root(), on_log, options).await?;

    on_progress(LoadProgress::Ready);
    Ok(handle)
}

/// Make sure a verified engine executable is cached, downloading if needed.
pub async fn ensure_engine(
    cache_dir: &Path,
    engine: &EngineSettings,
    on_progress: &impl Fn(LoadProgress),
) -> EngineResult<PathBuf> {
    let paths = EnginePaths::new(cache_dir);

    if engine.reuse_cache && paths.is_verified().await {
        tracing::info!("Engine already cached at {}", paths.executable.display());
        return Ok(paths.executable);
    }

    let client = reqwest::Client::new();
    fetch_and_install(&client, &paths, engine, on_progress).await
}

/// Download, unpack, verify and install the engine into `paths`.
async fn fetch_and_install(
    client: &reqwest::Client,
    paths: &EnginePaths,
    engine: &EngineSettings,
    on_progress: &impl Fn(LoadProgress),
) -> EngineResult<PathBuf> {
    tokio::fs::create_dir_all(&paths.root)
        .await
        .map_err(|e| EngineError::CreateDir {
            path: paths.root.clone(),
            source: e,
        })?;

    let assets = EngineAssets::for_current_platform(&engine.base_url)?;
    let expected = expected_digest(client, &assets, engine).await?;

    on_progress(LoadProgress::Downloading { percent: 0 });
    let archive = paths.archive_partial();
    let downloaded = download_to_file(client, &assets.archive_url, &archive, |percent| {
        on_progress(LoadProgress::Downloading { percent })
    })
    .await;
    if let Err(e) = downloaded {
        tokio::fs::remove_file(&archive).await.ok();
        return Err(e);
    }

    on_progress(LoadProgress::Verifying);
    let partial = paths.partial();
    let unpacked = unpack(archive.clone(), partial.clone()).await;
    tokio::fs::remove_file(&archive).await.ok();
    let actual = match unpacked {
        Ok(actual) => actual,
        Err(e) => {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e);
        }
    };

    match expected {
        Some(expected) if expected != actual => {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(EngineError::ChecksumMismatch {
                path: paths.executable.clone(),
                expected,
                actual,
            });
        }
        Some(_) => {}
        None => tracing::warn!(
            "No digest published for {}; recording {}",
            assets.archive_url,
            actual
        ),
    }

    make_executable(&partial)?;
    tokio::fs::rename(&partial, &paths.executable)
        .await
        .map_err(|e| EngineError::io("installing engine", e))?;
    tokio::fs::write(&paths.digest, format!("{}\n", actual))
        .await
        .map_err(|e| EngineError::io("caching engine digest", e))?;

    tracing::info!("Engine installed at {}", paths.executable.display());
    Ok(paths.executable.clone())
}

/// The digest the unpacked executable must match: the configured pin, else
/// the published `.sha256`. `None` when neither exists.
async fn expected_digest(
    client: &reqwest::Client,
    assets: &EngineAssets,
    engine: &EngineSettings,
) -> EngineResult<Option<String>> {
    if let Some(pinned) = engine.pinned_sha256() {
        return parse_digest(pinned, "engine.sha256").map(Some);
    }

    tracing::info!("Fetching engine digest from {}", assets.digest_url);
    let response = client.get(&assets.digest_url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(EngineError::HttpStatus {
            url: assets.digest_url.clone(),
            status: response.status().as_u16(),
        });
    }

    let text = response.text().await?;
    parse_digest(&text, &assets.digest_url).map(Some)
}

/// Stream `url` into `dest`.
async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: impl Fn(u8),
) -> EngineResult<()> {
    tracing::info!("Downloading engine from {}", url);

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(EngineError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| EngineError::io(format!("creating {}", dest.display()), e))?;
    let mut downloaded: u64 = 0;
    let mut last_percent = None;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| EngineError::io("writing engine download", e))?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let percent = download_percent(downloaded, total_size);
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                progress(percent);
            }
        }
    }

    file.flush()
        .await
        .map_err(|e| EngineError::io("writing engine download", e))?;
    Ok(())
}

/// Gunzip `archive` into `dest`, returning the SHA-256 of the unpacked bytes.
async fn unpack(archive: PathBuf, dest: PathBuf) -> EngineResult<String> {
    tokio::task::spawn_blocking(move || unpack_blocking(&archive, &dest))
        .await
        .map_err(|e| EngineError::io("unpacking engine", io::Error::other(e)))?
        .map_err(|e| EngineError::io("unpacking engine", e))
}

fn unpack_blocking(archive: &Path, dest: &Path) -> io::Result<String> {
    let mut decoder = GzDecoder::new(fs::File::open(archive)?);
    let mut out = fs::File::create(dest)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        out.write_all(&buf[..n])?;
    }
    out.flush()?;

    Ok(format!("{:x}", hasher.finalize()))
}

fn download_percent(downloaded: u64, total: u64) -> u8 {
    ((downloaded.min(total) as f64 / total as f64) * 100.0) as u8
}

#[cfg(unix)]
fn make_executable(path: &Path) -> EngineResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| EngineError::io(format!("marking {} executable", path.display()), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> EngineResult<()> {
    Ok(())
}
