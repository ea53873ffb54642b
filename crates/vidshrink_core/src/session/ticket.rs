//! Request identity for transcode work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::intake::SelectedFile;
use crate::engine::EngineHandle;

/// Monotonic request counter shared between the session and its work.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next sequence number, making every earlier one stale.
    pub fn advance(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.current() == seq
    }
}

/// Everything one transcode request needs, detached from the session.
#[derive(Debug, Clone)]
pub struct TranscodeTicket {
    pub seq: u64,
    pub file: SelectedFile,
    pub engine: Arc<EngineHandle>,
    sequence: RequestSequence,
}

impl TranscodeTicket {
    pub(crate) fn new(
        seq: u64,
        file: SelectedFile,
        engine: Arc<EngineHandle>,
        sequence: RequestSequence,
    ) -> Self {
        Self {
            seq,
            file,
            engine,
            sequence,
        }
    }

    /// False once a newer selection has been made.
    pub fn is_current(&self) -> bool {
        self.sequence.is_current(self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_makes_earlier_numbers_stale() {
        let sequence = RequestSequence::new();
        let first = sequence.advance();
        let shared = sequence.clone();
        let second = shared.advance();

        assert!(second > first);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }
}
