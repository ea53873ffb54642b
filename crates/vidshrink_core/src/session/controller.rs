//! Session controller: owns the engine, the selection and the current
//! artifact, and moves the session through its states.
//!
//! The controller never awaits. Async work (loading, transcoding) runs
//! elsewhere and reports back through [`Session::engine_loaded`],
//! [`Session::engine_failed`] and [`Session::finish_transcode`].

use std::sync::Arc;

use thiserror::Error;

use super::intake::SelectedFile;
use super::state::{Failure, FailureStage, SessionState};
use super::ticket::{RequestSequence, TranscodeTicket};
use crate::engine::EngineHandle;
use crate::transcode::{ArtifactStore, OutputArtifact, TranscodeOutcome, TranscodeReport};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    IllegalTransition {
        action: &'static str,
        state: &'static str,
    },
}

pub struct Session {
    state: SessionState,
    engine: Option<Arc<EngineHandle>>,
    selected: Option<SelectedFile>,
    sequence: RequestSequence,
    store: Arc<ArtifactStore>,
}

impl Session {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            state: SessionState::Unloaded,
            engine: None,
            selected: None,
            sequence: RequestSequence::new(),
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn engine(&self) -> Option<&Arc<EngineHandle>> {
        self.engine.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        self.state.artifact()
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Suggested save name for the current artifact.
    pub fn download_name(&self) -> Option<String> {
        self.artifact().map(OutputArtifact::download_name)
    }

    /// Enter `Loading`. Allowed from `Unloaded` and after a failed load.
    pub fn begin_load(&mut self) -> Result<(), SessionError> {
        if !self.state.can_load() {
            return Err(SessionError::IllegalTransition {
                action: "load the engine",
                state: self.state.name(),
            });
        }
        tracing::info!("Loading engine");
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Complete a load. Ignored unless the session is `Loading`.
    pub fn engine_loaded(&mut self, engine: Arc<EngineHandle>) -> bool {
        if !self.state.is_loading() {
            tracing::warn!("Ignoring engine load result while {}", self.state.name());
            return false;
        }
        tracing::info!("Engine loaded: {}", engine.version());
        self.engine = Some(engine);
        self.state = SessionState::Ready;
        true
    }

    /// Record a failed load. Ignored unless the session is `Loading`.
    pub fn engine_failed(&mut self, reason: impl Into<String>) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        let failure = Failure {
            stage: FailureStage::Load,
            reason: reason.into(),
        };
        tracing::error!("{}", failure);
        self.state = SessionState::Failed(failure);
        true
    }

    /// Replace (or clear) the selection.
    ///
    /// Always revokes the current artifact and invalidates in-flight work.
    /// Returns a ticket to run when the engine is ready and a file was
    /// chosen; re-selecting the same file yields a fresh ticket.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Option<TranscodeTicket> {
        self.revoke_current();
        let seq = self.sequence.advance();
        self.selected = file.clone();

        let Some(engine) = self.engine.clone() else {
            tracing::debug!("Selection stored, engine not ready");
            return None;
        };

        match file {
            Some(file) => {
                tracing::info!("Request #{}: {}", seq, file.path.display());
                self.state = SessionState::Processing { seq };
                Some(TranscodeTicket::new(seq, file, engine, self.sequence.clone()))
            }
            None => {
                self.state = SessionState::Ready;
                None
            }
        }
    }

    /// Apply a finished request. Returns true if it became the current
    /// result; stale reports are dropped and their artifacts revoked.
    pub fn finish_transcode(&mut self, report: TranscodeReport) -> bool {
        let current = matches!(self.state, SessionState::Processing { seq } if seq == report.seq)
            && self.sequence.is_current(report.seq);

        if !current {
            tracing::debug!("Discarding stale report #{}", report.seq);
            if let TranscodeOutcome::Completed(artifact) = &report.outcome {
                self.store.revoke(artifact);
            }
            return false;
        }

        match report.outcome {
            TranscodeOutcome::Completed(artifact) => {
                self.state = SessionState::Succeeded(artifact);
                true
            }
            TranscodeOutcome::Failed(reason) => {
                self.state = SessionState::Failed(Failure {
                    stage: FailureStage::Transcode,
                    reason,
                });
                true
            }
            // Only produced for stale tickets.
            TranscodeOutcome::Superseded => false,
        }
    }

    /// Release the artifact and engine. In-flight reports become stale.
    pub fn teardown(&mut self) {
        self.revoke_current();
        self.sequence.advance();
        self.selected = None;
        if self.engine.take().is_some() {
            tracing::info!("Engine released");
        }
        self.state = SessionState::Unloaded;
    }

    fn revoke_current(&mut self) {
        if let SessionState::Succeeded(artifact) = &self.state {
            self.store.revoke(artifact);
            self.state = SessionState::Ready;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn new_session(work: &TempDir) -> Session {
        let store = ArtifactStore::create_in(&work.path().join("work")).unwrap();
        Session::new(Arc::new(store))
    }

    #[test]
    fn selection_before_ready_is_a_no_op() {
        let work = tempdir().unwrap();
        let mut session = new_session(&work);

        assert!(session.select_file(Some(SelectedFile::from_path("a.mp4"))).is_none());
        assert_eq!(session.state(), &SessionState::Unloaded);
        assert_eq!(session.selected().and_then(|f| f.name()).as_deref(), Some("a.mp4"));
    }

    #[test]
    fn pending_load_never_exposes_transcoding() {
        let work = tempdir().unwrap();
        let mut session = new_session(&work);
        session.begin_load().unwrap();

        assert!(session.select_file(Some(SelectedFile::from_path("a.mp4"))).is_none());
        assert_eq!(session.state(), &SessionState::Loading);
        assert!(!session.is_ready());
        assert_eq!(
            session.begin_load(),
            Err(SessionError::IllegalTransition {
                action: "load the engine",
                state: "loading",
            })
        );
    }

    #[test]
    fn failed_load_allows_user_retry() {
        let work = tempdir().unwrap();
        let mut session = new_session(&work);
        session.begin_load().unwrap();

        assert!(session.engine_failed("HTTP 404"));
        let failure = session.state().failure().unwrap();
        assert_eq!(failure.stage, FailureStage::Load);
        assert_eq!(failure.reason, "HTTP 404");

        session.begin_load().unwrap();
        assert!(session.state().is_loading());
    }

    #[test]
    fn late_failure_outside_loading_is_ignored() {
        let work = tempdir().unwrap();
        let mut session = new_session(&work);
        assert!(!session.engine_failed("late"));
        assert_eq!(session.state(), &SessionState::Unloaded);
    }

    #[tokio::test]
    async fn stale_report_is_discarded_and_revoked() {
        let work = tempdir().unwrap();
        let mut session = new_session(&work);
        let stale = session.store().store(7, Some("old.mov"), b"old").await.unwrap();

        let published = session.finish_transcode(TranscodeReport {
            seq: 7,
            outcome: TranscodeOutcome::Completed(stale.clone()),
        });

        assert!(!published);
        assert!(!stale.is_live());
        assert_eq!(session.state(), &SessionState::Unloaded);
    }

    #[cfg(unix)]
    mod with_engine {
        use super::*;
        use crate::engine::testing::write_fake_engine;
        use crate::engine::EngineOptions;
        use crate::logging::{init_test_tracing, EngineLogCallback, StatusLine};
        use crate::transcode::{self, OUTPUT_MIME};

        struct Fixture {
            work: TempDir,
            session: Session,
            status: StatusLine,
            lines: Arc<parking_lot::Mutex<Vec<String>>>,
        }

        async fn ready_session() -> Fixture {
            init_test_tracing();
            let work = tempdir().unwrap();
            let script = write_fake_engine(work.path());
            let status = StatusLine::new();
            let lines = Arc::new(parking_lot::Mutex::new(Vec::new()));

            let publish = status.callback();
            let sink = lines.clone();
            let on_log: EngineLogCallback = Arc::new(move |line: &str| {
                sink.lock().push(line.to_string());
                publish(line);
            });

            let engine = EngineHandle::initialize(
                script,
                &work.path().join("work"),
                on_log,
                EngineOptions {
                    exec_timeout: None,
                    tail_lines: 5,
                },
            )
            .await
            .unwrap();

            let mut session = new_session(&work);
            session.begin_load().unwrap();
            assert!(session.engine_loaded(Arc::new(engine)));
            Fixture {
                work,
                session,
                status,
                lines,
            }
        }

        fn video(work: &TempDir, name: &str, content: &[u8]) -> SelectedFile {
            let path = work.path().join(name);
            std::fs::write(&path, content).unwrap();
            SelectedFile::from_path(path)
        }

        #[tokio::test]
        async fn selection_produces_mp4_artifact() {
            let mut fx = ready_session().await;
            assert_eq!(fx.status.current().as_deref(), Some("ffmpeg version fake-engine"));

            let file = video(&fx.work, "my video.mov", b"source");
            let ticket = fx.session.select_file(Some(file)).unwrap();
            assert!(fx.session.state().is_processing());
            assert!(fx.session.artifact().is_none());

            let report = transcode::run(ticket, fx.session.store().clone()).await;
            assert!(fx.session.finish_transcode(report));

            let artifact = fx.session.artifact().unwrap().clone();
            assert_eq!(artifact.mime, OUTPUT_MIME);
            assert_eq!(std::fs::read(&artifact.path).unwrap(), b"source transcoded");
            assert_eq!(
                fx.session.download_name().as_deref(),
                Some("my_video_compressed.mp4")
            );
            assert_eq!(fx.status.current().as_deref(), Some("video:1kB audio:0kB"));
        }

        #[tokio::test]
        async fn reselecting_same_file_runs_again_and_revokes_previous() {
            let mut fx = ready_session().await;
            let file = video(&fx.work, "clip.MP4", b"source");

            let first = fx.session.select_file(Some(file.clone())).unwrap();
            let report = transcode::run(first.clone(), fx.session.store().clone()).await;
            fx.session.finish_transcode(report);
            let previous = fx.session.artifact().unwrap().clone();

            let second = fx.session.select_file(Some(file)).unwrap();
            assert!(second.seq > first.seq);
            assert!(!previous.is_live());
            assert!(fx.session.artifact().is_none());

            let report = transcode::run(second, fx.session.store().clone()).await;
            assert!(fx.session.finish_transcode(report));
            assert_ne!(fx.session.artifact().unwrap().id, previous.id);
            assert_eq!(fx.session.store().live_count(), 1);
        }

        #[tokio::test]
        async fn overlapping_requests_publish_only_the_latest() {
            let mut fx = ready_session().await;
            let first_file = video(&fx.work, "first.mov", b"first");
            let second_file = video(&fx.work, "second.mov", b"second");

            let first = fx.session.select_file(Some(first_file)).unwrap();
            let second = fx.session.select_file(Some(second_file)).unwrap();
            let store = fx.session.store().clone();

            let (late, latest) =
                tokio::join!(transcode::run(first, store.clone()), transcode::run(second, store));

            assert_eq!(late.outcome, TranscodeOutcome::Superseded);
            assert!(!fx.session.finish_transcode(late));
            assert!(fx.session.finish_transcode(latest));
            assert_eq!(
                std::fs::read(&fx.session.artifact().unwrap().path).unwrap(),
                b"second transcoded"
            );
        }

        #[tokio::test]
        async fn argument_vector_ignores_hostile_file_names() {
            let mut fx = ready_session().await;
            let file = video(&fx.work, "$(touch pwned); \"x\" 'y'.mov", b"source");

            let ticket = fx.session.select_file(Some(file)).unwrap();
            let report = transcode::run(ticket, fx.session.store().clone()).await;
            assert!(fx.session.finish_transcode(report));

            assert!(fx.lines.lock().iter().any(|line| line
                == "args: -i input.mp4 -vcodec libx264 -b:v 2000k -vf scale=-2:1280 -preset fast output.mp4"));
            assert!(!fx.work.path().join("pwned").exists());
            assert_eq!(
                fx.session.download_name().as_deref(),
                Some("$(touch_pwned);_\"x\"_'y'_compressed.mp4")
            );
        }

        #[tokio::test]
        async fn progress_redraws_become_separate_status_lines() {
            let mut fx = ready_session().await;
            let file = video(&fx.work, "a.mp4", b"a");
            let ticket = fx.session.select_file(Some(file)).unwrap();
            transcode::run(ticket, fx.session.store().clone()).await;

            let lines = fx.lines.lock();
            assert!(lines.iter().any(|l| l == "frame=    1 fps=0.0"));
            assert!(lines.iter().any(|l| l == "frame=    2 fps=0.0"));
            assert_eq!(lines.last().map(String::as_str), Some("video:1kB audio:0kB"));
        }

        #[tokio::test]
        async fn engine_failure_is_reported_and_recoverable() {
            let mut fx = ready_session().await;
            let bad = video(&fx.work, "broken.avi", b"CORRUPT");

            let ticket = fx.session.select_file(Some(bad)).unwrap();
            let report = transcode::run(ticket, fx.session.store().clone()).await;
            assert!(fx.session.finish_transcode(report));

            let failure = fx.session.state().failure().unwrap().clone();
            assert_eq!(failure.stage, FailureStage::Transcode);
            assert!(failure.reason.contains("exit code 183"));
            assert!(failure.reason.contains("Invalid data found"));
            assert!(!fx.session.state().can_load());

            let good = video(&fx.work, "good.mp4", b"fine");
            let ticket = fx.session.select_file(Some(good)).unwrap();
            let report = transcode::run(ticket, fx.session.store().clone()).await;
            assert!(fx.session.finish_transcode(report));
            assert!(fx.session.artifact().is_some());
        }

        #[tokio::test]
        async fn hung_engine_times_out() {
            let work = tempdir().unwrap();
            let script = write_fake_engine(work.path());
            let engine = EngineHandle::initialize(
                script,
                &work.path().join("work"),
                StatusLine::new().callback(),
                EngineOptions {
                    exec_timeout: Some(std::time::Duration::from_secs(1)),
                    tail_lines: 5,
                },
            )
            .await
            .unwrap();

            let mut session = new_session(&work);
            session.begin_load().unwrap();
            session.engine_loaded(Arc::new(engine));

            let slow = video(&work, "slow.mp4", b"SLOW");
            let ticket = session.select_file(Some(slow)).unwrap();
            let report = transcode::run(ticket, session.store().clone()).await;
            assert!(session.finish_transcode(report));

            let failure = session.state().failure().unwrap();
            assert_eq!(failure.stage, FailureStage::Transcode);
            assert_eq!(failure.reason, "Engine invocation timed out after 1s");
        }

        #[tokio::test]
        async fn clearing_selection_returns_to_ready() {
            let mut fx = ready_session().await;
            let file = video(&fx.work, "a.mp4", b"a");
            let ticket = fx.session.select_file(Some(file)).unwrap();
            let report = transcode::run(ticket, fx.session.store().clone()).await;
            fx.session.finish_transcode(report);
            let artifact = fx.session.artifact().unwrap().clone();

            assert!(fx.session.select_file(None).is_none());
            assert_eq!(fx.session.state(), &SessionState::Ready);
            assert!(!artifact.is_live());
        }

        #[tokio::test]
        async fn teardown_releases_engine_and_artifact() {
            let mut fx = ready_session().await;
            let file = video(&fx.work, "a.mp4", b"a");
            let ticket = fx.session.select_file(Some(file)).unwrap();
            let report = transcode::run(ticket, fx.session.store().clone()).await;
            fx.session.finish_transcode(report);
            let artifact = fx.session.artifact().unwrap().clone();

            fx.session.teardown();
            assert!(!artifact.is_live());
            assert!(!fx.session.is_ready());
            assert_eq!(fx.session.state(), &SessionState::Unloaded);
        }
    }
}
