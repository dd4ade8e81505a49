//! Progress reporting for batch passes.
//!
//! The dispatcher advances a sink once per completed item regardless of its outcome.
//! Rendering (progress bars) lives at the CLI boundary behind this trait.

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait ProgressSink: Send + Sync {
    /// A pass named `label` is starting with `total` items.
    fn begin(&self, _label: &str, _total: usize) {}

    fn advance(&self, delta: usize);

    fn finish(&self) {}

    /// The pass was dropped before every item completed.
    fn abandon(&self) {}
}

/// Sink that ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&self, _delta: usize) {}
}

/// Monotonic completed-item counter.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicUsize,
    completed: AtomicUsize,
    abandoned: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Passes dropped before completing.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

impl ProgressSink for ProgressCounter {
    fn begin(&self, _label: &str, total: usize) {
        self.total.fetch_add(total, Ordering::SeqCst);
    }

    fn advance(&self, delta: usize) {
        self.completed.fetch_add(delta, Ordering::SeqCst);
    }

    fn abandon(&self) {
        self.abandoned.fetch_add(1, Ordering::SeqCst);
    }
}
