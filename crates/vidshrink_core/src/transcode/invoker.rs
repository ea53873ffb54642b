//! Transcode invoker.
//!
//! Runs one request against the engine: stage the selected file as
//! `input.mp4`, run the fixed command, read `output.mp4` back and store it
//! as an artifact.

use std::sync::Arc;

use thiserror::Error;

use super::artifact::{ArtifactStore, OutputArtifact, PublishError};
use super::command::{command_line, COMPRESS_ARGS, INPUT_NAME, OUTPUT_NAME};
use crate::engine::{EngineError, EngineLease, EngineResult, StagingFs};
use crate::session::TranscodeTicket;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// How one request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Completed(OutputArtifact),
    /// A newer selection arrived before the engine was free.
    Superseded,
    Failed(String),
}

/// Result of a request, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    pub seq: u64,
    pub outcome: TranscodeOutcome,
}

/// Run the request described by `ticket`. Never panics on engine failure;
/// errors come back as [`TranscodeOutcome::Failed`].
pub async fn run(ticket: TranscodeTicket, store: Arc<ArtifactStore>) -> TranscodeReport {
    let seq = ticket.seq;
    let outcome = match execute(&ticket, &store).await {
        Ok(Some(artifact)) => {
            tracing::info!(
                "Request #{} done: {} bytes -> {}",
                seq,
                artifact.len,
                artifact.path.display()
            );
            TranscodeOutcome::Completed(artifact)
        }
        Ok(None) => {
            tracing::debug!("Request #{} superseded before start", seq);
            TranscodeOutcome::Superseded
        }
        Err(e) => {
            tracing::error!("Request #{} ({}) failed: {}", seq, ticket.file.path.display(), e);
            TranscodeOutcome::Failed(e.to_string())
        }
    };

    TranscodeReport { seq, outcome }
}

async fn execute(
    ticket: &TranscodeTicket,
    store: &ArtifactStore,
) -> Result<Option<OutputArtifact>, TranscodeError> {
    let lease = ticket.engine.lease().await;
    if !ticket.is_current() {
        return Ok(None);
    }

    lease.fs().remove_file(OUTPUT_NAME).await?;
    let result = stage_and_run(ticket, &lease).await;
    clear_staging(lease.fs()).await;
    drop(lease);

    let output = result?;
    let artifact = store.store(ticket.seq, ticket.file.name().as_deref(), &output).await?;
    Ok(Some(artifact))
}

/// Stage the input, run the command and read the output back.
async fn stage_and_run(ticket: &TranscodeTicket, lease: &EngineLease<'_>) -> EngineResult<Vec<u8>> {
    let fs = lease.fs();
    let staged = fs.copy_in(INPUT_NAME, &ticket.file.path).await?;
    tracing::info!(
        "Request #{}: staged {} ({} bytes) as {}",
        ticket.seq,
        ticket.file.path.display(),
        staged,
        INPUT_NAME
    );
    tracing::debug!("Request #{}: ffmpeg {}", ticket.seq, command_line());

    lease.exec(&COMPRESS_ARGS).await?;
    fs.read_file(OUTPUT_NAME).await
}

/// Remove both staged files, whatever state the run left them in.
async fn clear_staging(fs: &StagingFs) {
    for name in [INPUT_NAME, OUTPUT_NAME] {
        if let Err(e) = fs.remove_file(name).await {
            tracing::warn!("Failed to clear staged {}: {}", name, e);
        }
    }
}
