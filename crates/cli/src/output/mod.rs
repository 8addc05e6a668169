//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also renders PathStore progress as terminal bars.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::TransferProgress;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress bar
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Progress bars are drawn only for interactive human output
    pub fn shows_progress(&self) -> bool {
        !(self.quiet || self.json || self.no_progress)
    }
}
