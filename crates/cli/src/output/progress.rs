//! Terminal progress bars for PathStore operations
//!
//! Each task PathStore starts becomes one bar in a shared MultiProgress, so
//! nested folder levels stack under each other while they run.

use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use ps_core::{Progress, ProgressHandle, ProgressUnit, no_progress};

use super::OutputConfig;

const BYTES_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";
const ITEMS_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}";

/// Progress observer drawing indicatif bars
#[derive(Debug, Clone)]
pub struct TransferProgress {
    multi: MultiProgress,
}

impl TransferProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Observer that renders nothing, for tests
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Observer for the given output mode: bars for interactive human
    /// output, otherwise a no-op
    pub fn for_output(config: &OutputConfig) -> Arc<dyn Progress> {
        if config.shows_progress() {
            Arc::new(Self::new())
        } else {
            no_progress()
        }
    }
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn style_for(unit: ProgressUnit) -> ProgressStyle {
    let template = match unit {
        ProgressUnit::Bytes => BYTES_TEMPLATE,
        ProgressUnit::Items => ITEMS_TEMPLATE,
    };
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl Progress for TransferProgress {
    fn start(&self, label: &str, total: u64, unit: ProgressUnit) -> Box<dyn ProgressHandle> {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(style_for(unit));
        bar.set_message(label.to_string());
        Box::new(BarHandle { bar })
    }
}

struct BarHandle {
    bar: ProgressBar,
}

impl ProgressHandle for BarHandle {
    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
