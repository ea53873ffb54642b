//! Session state.

use std::fmt;

use crate::transcode::OutputArtifact;

/// Where a failure happened; decides what the user can do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Fetching or starting the engine. The user may load again.
    Load,
    /// Compressing a file. The engine stays ready for another selection.
    Transcode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub stage: FailureStage,
    pub reason: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            FailureStage::Load => write!(f, "Engine failed to load: {}", self.reason),
            FailureStage::Transcode => write!(f, "Compression failed: {}", self.reason),
        }
    }
}

/// Everything the UI needs to know, as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No engine yet.
    Unloaded,
    /// Engine fetch/initialisation in flight.
    Loading,
    /// Engine ready, nothing selected or selection cleared.
    Ready,
    /// Request `seq` is being compressed.
    Processing { seq: u64 },
    /// The current artifact, produced for the current selection.
    Succeeded(OutputArtifact),
    Failed(Failure),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unloaded => "unloaded",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Processing { .. } => "processing",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }

    /// The load control is offered only here.
    pub fn can_load(&self) -> bool {
        matches!(
            self,
            SessionState::Unloaded
                | SessionState::Failed(Failure {
                    stage: FailureStage::Load,
                    ..
                })
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, SessionState::Processing { .. })
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        match self {
            SessionState::Succeeded(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SessionState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_offered_only_when_unloaded_or_load_failed() {
        assert!(SessionState::Unloaded.can_load());
        assert!(!SessionState::Loading.can_load());
        assert!(!SessionState::Ready.can_load());
        assert!(SessionState::Failed(Failure {
            stage: FailureStage::Load,
            reason: "HTTP 404".to_string(),
        })
        .can_load());
        assert!(!SessionState::Failed(Failure {
            stage: FailureStage::Transcode,
            reason: "exit 1".to_string(),
        })
        .can_load());
    }

    #[test]
    fn failure_display_names_stage() {
        let failure = Failure {
            stage: FailureStage::Transcode,
            reason: "ffmpeg failed with exit code 1".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "Compression failed: ffmpeg failed with exit code 1"
        );
    }
}
