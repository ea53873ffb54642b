//! Latest-line status display and bounded output tail.
//!
//! The engine is chatty: every stderr line replaces the status line, and the
//! last few lines are kept so a failure can be reported with context.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::types::EngineLogCallback;

#[derive(Debug, Clone)]
struct Entry {
    message: String,
    updated_at: DateTime<Local>,
}

/// Most recent engine message, overwritten on every emission.
///
/// Cheap to clone; all clones share the same line.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    inner: Arc<Mutex<Option<Entry>>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current line.
    pub fn publish(&self, message: &str) {
        *self.inner.lock() = Some(Entry {
            message: message.to_string(),
            updated_at: Local::now(),
        });
    }

    /// Current line, if anything was published yet.
    pub fn current(&self) -> Option<String> {
        self.inner.lock().as_ref().map(|e| e.message.clone())
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.inner.lock().as_ref().map(|e| e.updated_at)
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }

    /// Callback that publishes each engine line here.
    pub fn callback(&self) -> EngineLogCallback {
        let line = self.clone();
        Arc::new(move |message: &str| line.publish(message))
    }
}

/// Fixed-capacity buffer of the most recent output lines.
#[derive(Debug)]
pub struct OutputTail {
    capacity: usize,
    lines: VecDeque<String>,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joined lines, oldest first.
    pub fn render(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
