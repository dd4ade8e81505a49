//! Terminal progress bar for dispatch passes.

use crate::progress::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {prefix:.bold}▕{bar:40.blue}▏{pos}/{len} {msg}";

/// `ProgressSink` drawing one bar per pass on stderr.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for BarProgress {
    fn begin(&self, label: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        bar.set_prefix(label.to_string());
        if let Some(previous) = self.bar.lock().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, delta: usize) {
        if let Some(bar) = self.bar.lock().as_ref() {
            bar.inc(delta as u64);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_with_message("done");
        }
    }

    fn abandon(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
    }
}
