//! A loaded engine instance and its serialised command interface.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{Mutex, MutexGuard};

use super::error::{EngineError, EngineResult};
use super::staging::StagingFs;
use crate::logging::{EngineLogCallback, OutputTail};

/// Tool name used in error reports.
const ENGINE_TOOL: &str = "ffmpeg";

/// Per-instance invocation options.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Upper bound for one invocation; `None` waits indefinitely.
    pub exec_timeout: Option<Duration>,
    /// Output lines kept for error reports.
    pub tail_lines: usize,
}

/// A ready engine: executable, private staging area and log callback.
///
/// All staging and command operations go through [`EngineHandle::lease`],
/// so work submitted by different requests never interleaves.
pub struct EngineHandle {
    executable: PathBuf,
    version: String,
    on_log: EngineLogCallback,
    options: EngineOptions,
    staging: Mutex<StagingFs>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("executable", &self.executable)
            .field("version", &self.version)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// Launch the engine once to confirm it runs, then set up staging.
    ///
    /// The first line of the version banner is published through `on_log`.
    pub async fn initialize(
        executable: PathBuf,
        work_root: &Path,
        on_log: EngineLogCallback,
        options: EngineOptions,
    ) -> EngineResult<Self> {
        tracing::debug!("Probing engine: {}", executable.display());

        let output = Command::new(&executable)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Launch {
                path: executable.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(EngineError::command_failed(
                ENGINE_TOOL,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        on_log(&version);

        let staging = StagingFs::create_in(work_root)?;
        tracing::info!("Engine ready: {} ({})", version, executable.display());

        Ok(Self {
            executable,
            version,
            on_log,
            options,
            staging: Mutex::new(staging),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// First line of the engine's version banner.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Wait for exclusive use of the engine.
    pub async fn lease(&self) -> EngineLease<'_> {
        EngineLease {
            handle: self,
            staging: self.staging.lock().await,
        }
    }
}

/// Exclusive access to the engine for one request.
pub struct EngineLease<'a> {
    handle: &'a EngineHandle,
    staging: MutexGuard<'a, StagingFs>,
}

impl EngineLease<'_> {
    pub fn fs(&self) -> &StagingFs {
        &self.staging
    }

    /// Run the engine with `args` inside the staging directory.
    ///
    /// Every output line is forwarded to the engine's log callback; on a
    /// non-zero exit the last lines form the error message.
    pub async fn exec(&self, args: &[&str]) -> EngineResult<()> {
        let handle = self.handle;
        tracing::info!("$ {} {}", ENGINE_TOOL, args.join(" "));

        let mut child = Command::new(&handle.executable)
            .args(args)
            .current_dir(self.staging.root())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Launch {
                path: handle.executable.clone(),
                source: e,
            })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            EngineError::io(
                "capturing engine output",
                io::Error::new(io::ErrorKind::BrokenPipe, "stderr not captured"),
            )
        })?;

        let mut tail = OutputTail::new(handle.options.tail_lines);
        let run = async {
            forward_lines(stderr, |line| {
                tracing::debug!(target: "engine", "{}", line);
                (handle.on_log)(line);
                tail.push(line);
            })
            .await
            .map_err(|e| EngineError::io("reading engine output", e))?;

            child
                .wait()
                .await
                .map_err(|e| EngineError::io("waiting for engine", e))
        };

        let status = match handle.options.exec_timeout {
            Some(limit) => {
                let finished = tokio::time::timeout(limit, run).await;
                match finished {
                    Ok(result) => result?,
                    Err(_) => {
                        let _ = child.start_kill();
                        tracing::warn!("Engine timed out after {:?}, killed", limit);
                        return Err(EngineError::Timeout(limit));
                    }
                }
            }
            None => run.await?,
        };

        if !status.success() {
            return Err(EngineError::command_failed(
                ENGINE_TOOL,
                status.code().unwrap_or(-1),
                tail.render(),
            ));
        }

        Ok(())
    }
}

/// Split a byte stream into lines on `\n` or `\r` and hand each non-blank
/// line to `on_line`. ffmpeg redraws progress with bare carriage returns.
pub(crate) async fn forward_lines<R>(mut reader: R, mut on_line: impl FnMut(&str)) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &mut on_line);
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, &mut on_line);

    Ok(())
}

fn flush_line(pending: &mut Vec<u8>, on_line: &mut impl FnMut(&str)) {
    if pending.is_empty() {
        return;
    }
    {
        let line = String::from_utf8_lossy(pending);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            on_line(trimmed);
        }
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forward_lines_splits_on_carriage_returns() {
        let input: &[u8] = b"Input #0, mov\nframe=  1\rframe=  2\r\n\n  \ndone";
        let mut lines = Vec::new();
        forward_lines(input, |l| lines.push(l.to_string())).await.unwrap();

        assert_eq!(lines, vec!["Input #0, mov", "frame=  1", "frame=  2", "done"]);
    }

    #[tokio::test]
    async fn forward_lines_tolerates_invalid_utf8() {
        let input: &[u8] = b"caf\xe9\n";
        let mut lines = Vec::new();
        forward_lines(input, |l| lines.push(l.to_string())).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("caf"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_executable_fails_to_launch() {
        let work = tempfile::tempdir().unwrap();
        let on_log: EngineLogCallback = std::sync::Arc::new(|_: &str| {});
        let err = EngineHandle::initialize(
            work.path().join("no-such-engine"),
            work.path(),
            on_log,
            EngineOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
